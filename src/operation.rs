use hashbrown::HashMap;

/// What a keypad operation does to the accumulator
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Replaces the accumulator with a fixed value
    Constant(f64),
    /// Applies a function to the accumulator
    Unary(fn(f64) -> f64),
    /// Combines a first operand with the next accumulator value
    Binary(fn(f64, f64) -> f64),
    /// Replaces the accumulator with a freshly produced value
    Niladic(fn() -> f64),
    /// Resolves the pending binary operation
    Equals,
}

/// Uniform draw in `[0, 1)`
fn random() -> f64 {
    rand::random::<f64>()
}

lazy_static! {
    /// Every operation understood by the engine, keyed by its key label
    pub static ref OPERATIONS: HashMap<String, Operation> = {
        let mut map = HashMap::<String, Operation>::new();
        map.insert("π".into(), Operation::Constant(std::f64::consts::PI));
        map.insert("e".into(), Operation::Constant(std::f64::consts::E));
        map.insert("√".into(), Operation::Unary(f64::sqrt));
        map.insert("1/x".into(), Operation::Unary(f64::recip));
        map.insert("%".into(), Operation::Unary(|x| x / 100.0));
        map.insert("cos".into(), Operation::Unary(f64::cos));
        map.insert("sin".into(), Operation::Unary(f64::sin));
        map.insert("tan".into(), Operation::Unary(f64::tan));
        map.insert("Ran".into(), Operation::Niladic(random));
        map.insert("±".into(), Operation::Unary(|x| -x));
        map.insert("×".into(), Operation::Binary(|a, b| a * b));
        map.insert("÷".into(), Operation::Binary(|a, b| a / b));
        map.insert("+".into(), Operation::Binary(|a, b| a + b));
        map.insert("−".into(), Operation::Binary(|a, b| a - b));
        map.insert("=".into(), Operation::Equals);
        map.shrink_to_fit();
        map
    };
}

#[cfg(test)]
mod tests {
    use super::{Operation, OPERATIONS};
    use test_case::test_case;

    fn unary(symbol: &str) -> fn(f64) -> f64 {
        match OPERATIONS[symbol] {
            Operation::Unary(function) => function,
            other => panic!("{} is {:?}", symbol, other),
        }
    }

    fn binary(symbol: &str) -> fn(f64, f64) -> f64 {
        match OPERATIONS[symbol] {
            Operation::Binary(function) => function,
            other => panic!("{} is {:?}", symbol, other),
        }
    }

    #[test_case("√", 9.0 => 3.0 ; "square root")]
    #[test_case("1/x", 4.0 => 0.25 ; "reciprocal")]
    #[test_case("%", 50.0 => 0.5 ; "percent")]
    #[test_case("±", 3.0 => -3.0 ; "negate")]
    #[test_case("cos", 0.0 => 1.0 ; "cosine")]
    #[test_case("sin", 0.0 => 0.0 ; "sine")]
    #[test_case("tan", 0.0 => 0.0 ; "tangent")]
    fn unaries(symbol: &str, x: f64) -> f64 {
        unary(symbol)(x)
    }

    #[test_case("×", 6.0, 7.0 => 42.0 ; "multiply")]
    #[test_case("÷", 1.0, 4.0 => 0.25 ; "divide")]
    #[test_case("+", 2.0, 3.0 => 5.0 ; "add")]
    #[test_case("−", 2.0, 3.0 => -1.0 ; "subtract first minus second")]
    fn binaries(symbol: &str, a: f64, b: f64) -> f64 {
        binary(symbol)(a, b)
    }

    #[test]
    fn constants() {
        assert!(matches!(OPERATIONS["π"], Operation::Constant(v) if v == std::f64::consts::PI));
        assert!(matches!(OPERATIONS["e"], Operation::Constant(v) if v == std::f64::consts::E));
        assert!(matches!(OPERATIONS["="], Operation::Equals));
        assert_eq!(OPERATIONS.len(), 15);
    }

    #[test]
    fn random_is_unit_interval() {
        let draw = match OPERATIONS["Ran"] {
            Operation::Niladic(function) => function,
            other => panic!("Ran is {:?}", other),
        };
        for _ in 0..1000 {
            let x = draw();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn floating_point_edges_are_not_trapped() {
        assert!(binary("÷")(1.0, 0.0).is_infinite());
        assert!(unary("1/x")(0.0).is_infinite());
        assert!(unary("√")(-1.0).is_nan());
    }
}
