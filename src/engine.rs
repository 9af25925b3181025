use crate::format::{NumberFormat, NumberFormatter};
use crate::operation::{Operation, OPERATIONS};
use crate::token::{Literal, Primitive, Token};
use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use tracing::{debug, trace, warn};

/// The outcome of replaying a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Current value, or the first operand of a pending operation when no
    /// second operand was entered yet. `None` when nothing was entered.
    pub result: Option<f64>,
    /// Whether a binary operation is waiting for its second operand
    pub is_pending: bool,
    /// Infix rendering of everything entered so far
    pub description: String,
}

/// History line: the description followed by `...` while an operation is
/// pending and `=` otherwise.
///
/// ```
/// use keycalc::Engine;
///
/// let mut engine = Engine::new();
/// engine.set_operand(7.0);
/// engine.perform_operation("+");
/// assert_eq!(engine.evaluate().to_string(), "7+...");
/// engine.set_operand(3.0);
/// engine.perform_operation("=");
/// assert_eq!(engine.evaluate().to_string(), "7+3=");
/// ```
impl Display for Evaluation {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        if self.description.is_empty() {
            return Ok(());
        }
        let suffix = if self.is_pending { "..." } else { "=" };
        write!(fmt, "{}{}", self.description, suffix)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingBinaryOperation {
    function: fn(f64, f64) -> f64,
    first_operand: f64,
}

impl PendingBinaryOperation {
    fn perform(self, second_operand: f64) -> f64 {
        (self.function)(self.first_operand, second_operand)
    }
}

/// Working state of a single replay pass, rebuilt from scratch every time.
struct Replay<'a> {
    variables: &'a HashMap<String, f64>,
    formatter: &'a dyn NumberFormat,
    accumulator: Option<f64>,
    pending: Option<PendingBinaryOperation>,
    descriptions: Vec<String>,
}

impl<'a> Replay<'a> {
    fn new(variables: &'a HashMap<String, f64>, formatter: &'a dyn NumberFormat) -> Self {
        Replay {
            variables,
            formatter,
            accumulator: None,
            pending: None,
            descriptions: Vec::new(),
        }
    }

    fn run(&mut self, program: &[Token]) {
        for token in program {
            match *token {
                Token::Operand(ref literal) => self.operand(literal),
                Token::Operation(ref symbol) => {
                    if let Some(operation) = OPERATIONS.get(symbol) {
                        self.operation(symbol, *operation);
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.accumulator = None;
        self.pending = None;
        self.descriptions.clear();
    }

    fn operand(&mut self, literal: &Literal) {
        if self.pending.is_none() {
            self.reset();
        }
        let (value, fragment) = match *literal {
            Literal::Value(value) => (value, self.formatter.format(value)),
            Literal::Variable(ref name) => {
                let value = self.variables.get(name).copied().unwrap_or(0.0);
                (value, name.clone())
            }
        };
        self.accumulator = Some(value);
        self.descriptions.push(fragment);
    }

    /// Apply one operation. Returns `false` when it had no effect.
    fn operation(&mut self, symbol: &str, operation: Operation) -> bool {
        match operation {
            Operation::Constant(value) => {
                if self.pending.is_none() {
                    self.reset();
                }
                self.accumulator = Some(value);
                self.descriptions.push(symbol.to_owned());
            }
            Operation::Niladic(function) => {
                if self.pending.is_none() {
                    self.reset();
                }
                self.accumulator = Some(function());
                self.descriptions.push(symbol.to_owned());
            }
            Operation::Unary(function) => {
                let operand = match self.accumulator {
                    Some(operand) => operand,
                    None => return false,
                };
                if self.pending.is_some() {
                    // only the second operand is wrapped: 3+√(4)
                    let last = self.descriptions.pop().unwrap_or_default();
                    self.descriptions.push(format!("{}({})", symbol, last));
                } else {
                    self.descriptions.insert(0, format!("{}(", symbol));
                    self.descriptions.push(")".into());
                }
                self.accumulator = Some(function(operand));
            }
            Operation::Binary(function) => {
                let mut operand = match self.accumulator.take() {
                    Some(operand) => operand,
                    None => return false,
                };
                if let Some(pending) = self.pending.take() {
                    operand = pending.perform(operand);
                }
                self.pending = Some(PendingBinaryOperation {
                    function,
                    first_operand: operand,
                });
                self.descriptions.push(symbol.to_owned());
            }
            Operation::Equals => match (self.pending, self.accumulator) {
                (Some(pending), Some(operand)) => {
                    self.accumulator = Some(pending.perform(operand));
                    self.pending = None;
                }
                _ => return false,
            },
        }
        true
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn finish(self) -> Evaluation {
        let result = self
            .accumulator
            .or_else(|| self.pending.map(|pending| pending.first_operand));
        Evaluation {
            result,
            is_pending: self.pending.is_some(),
            description: self.descriptions.concat(),
        }
    }
}

/// A keypad calculator.
///
/// Operands and operations are recorded in a program, one key at a time.
/// Binary operations combine strictly in entry order: `2+3×4` is `20`.
/// Every query replays the whole program, so the result and the description
/// can never drift apart from what was entered.
///
/// # Examples
///
/// ```
/// use keycalc::Engine;
///
/// let mut engine = Engine::new();
/// engine.set_operand(7.0);
/// engine.perform_operation("+");
/// engine.set_operand(3.0);
/// engine.perform_operation("=");
///
/// let evaluation = engine.evaluate();
/// assert_eq!(evaluation.result, Some(10.0));
/// assert_eq!(evaluation.is_pending, false);
/// assert_eq!(evaluation.description, "7+3");
/// ```
///
/// Variables are resolved at evaluation time, unbound ones being `0`:
///
/// ```
/// use keycalc::Engine;
/// use std::collections::HashMap;
///
/// let mut engine = Engine::new();
/// engine.set_variable_operand("M");
/// engine.perform_operation("×");
/// engine.set_operand(2.0);
/// engine.perform_operation("=");
/// assert_eq!(engine.evaluate().result, Some(0.0));
///
/// let mut context: HashMap<String, f64> = HashMap::new();
/// context.insert("M".into(), 4.0);
/// assert_eq!(engine.evaluate_with(&context).result, Some(8.0));
/// ```
pub struct Engine {
    program: Vec<Token>,
    variables: HashMap<String, f64>,
    formatter: Box<dyn NumberFormat>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_formatter(NumberFormatter::default())
    }
}

impl Debug for Engine {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("Engine")
            .field("program", &self.program)
            .field("variables", &self.variables)
            .finish()
    }
}

impl Engine {
    /// Create an empty engine rendering numbers with the default
    /// [`NumberFormatter`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty engine rendering numbers with `formatter`
    pub fn with_formatter<F>(formatter: F) -> Self
    where
        F: NumberFormat + 'static,
    {
        Self {
            program: Vec::new(),
            variables: HashMap::new(),
            formatter: Box::new(formatter),
        }
    }

    /// Replace the formatter used for descriptions
    pub fn set_formatter<F>(&mut self, formatter: F)
    where
        F: NumberFormat + 'static,
    {
        self.formatter = Box::new(formatter);
    }

    /// The formatter used for descriptions, also suited to parse keypad input
    pub fn formatter(&self) -> &dyn NumberFormat {
        self.formatter.as_ref()
    }

    /// Enter a number. Starts a new expression unless an operation is
    /// waiting for its second operand.
    pub fn set_operand(&mut self, value: f64) {
        self.push_operand(Literal::Value(value));
    }

    /// Enter a variable. Starts a new expression unless an operation is
    /// waiting for its second operand.
    pub fn set_variable_operand<S: Into<String>>(&mut self, name: S) {
        self.push_operand(Literal::Variable(name.into()));
    }

    fn push_operand(&mut self, literal: Literal) {
        if !self.is_pending() {
            self.start_over();
        }
        trace!(operand = ?literal, "appending operand");
        self.program.push(Token::Operand(literal));
    }

    /// Press the key labelled `symbol`.
    ///
    /// Keys that are unknown, or that have nothing to act on (a unary
    /// operation without an operand, a second binary operator in a row, `=`
    /// with nothing pending), are ignored and leave the program untouched.
    pub fn perform_operation(&mut self, symbol: &str) {
        let operation = match OPERATIONS.get(symbol) {
            Some(operation) => *operation,
            None => {
                debug!(symbol, "ignoring unknown operation");
                return;
            }
        };
        let starts_expression = matches!(operation, Operation::Constant(_) | Operation::Niladic(_));
        if starts_expression && !self.is_pending() {
            self.start_over();
        }

        let mut replay = Replay::new(&self.variables, self.formatter.as_ref());
        replay.run(&self.program);
        if replay.operation(symbol, operation) {
            trace!(symbol, "appending operation");
            self.program.push(Token::Operation(symbol.to_owned()));
        } else {
            debug!(symbol, "ignoring operation without operand");
        }
    }

    /// Replay the program with the engine's own variable bindings.
    ///
    /// The `Ran` key draws a new number on every replay, so a program using
    /// it gives a different result each time.
    pub fn evaluate(&self) -> Evaluation {
        self.evaluate_with(&self.variables)
    }

    /// Make `bindings` the engine's variable bindings, then replay.
    ///
    /// Later calls to [`evaluate`](#method.evaluate) keep using them, which is
    /// how a memory key stores a value into `M`.
    ///
    /// ```
    /// use keycalc::Engine;
    /// use std::collections::HashMap;
    ///
    /// let mut engine = Engine::new();
    /// engine.set_variable_operand("M");
    /// engine.perform_operation("+");
    /// engine.set_operand(3.0);
    /// engine.perform_operation("=");
    ///
    /// let mut bindings: HashMap<String, f64> = HashMap::new();
    /// bindings.insert("M".into(), 5.0);
    /// assert_eq!(engine.evaluate_using(bindings).result, Some(8.0));
    /// assert_eq!(engine.evaluate().result, Some(8.0));
    /// ```
    pub fn evaluate_using(&mut self, bindings: HashMap<String, f64>) -> Evaluation {
        trace!(bound = bindings.len(), "replacing variable bindings");
        self.variables = bindings;
        self.evaluate()
    }

    /// Replay the program with the given variable bindings, for a one-off
    /// look. The engine's own bindings are neither used nor changed.
    pub fn evaluate_with<'a, C>(&self, context: C) -> Evaluation
    where
        C: Into<&'a HashMap<String, f64>>,
    {
        let mut replay = Replay::new(context.into(), self.formatter.as_ref());
        replay.run(&self.program);
        replay.finish()
    }

    /// Check if a binary operation is waiting for its second operand
    pub fn is_pending(&self) -> bool {
        let mut replay = Replay::new(&self.variables, self.formatter.as_ref());
        replay.run(&self.program);
        replay.is_pending()
    }

    /// Drop the last entry and replay. Returns `None` if there was nothing to
    /// undo.
    pub fn undo(&mut self) -> Option<Evaluation> {
        let token = self.program.pop()?;
        trace!(?token, "undo");
        Some(self.evaluate())
    }

    /// Forget the program and every variable binding
    pub fn clear(&mut self) {
        self.program.clear();
        self.variables.clear();
    }

    fn start_over(&mut self) {
        if !self.program.is_empty() {
            trace!(dropped = self.program.len(), "starting a new expression");
            self.program.clear();
        }
    }

    /// Bind `name` to `value` for later evaluations
    pub fn set_variable<S: Into<String>>(&mut self, name: S, value: f64) {
        self.variables.insert(name.into(), value);
    }

    /// Current binding of `name`, if any
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// All current variable bindings
    pub fn variables(&self) -> &HashMap<String, f64> {
        &self.variables
    }

    /// Recorded entries, oldest first
    pub fn tokens(&self) -> &[Token] {
        &self.program
    }

    /// The program flattened to numbers and strings, for storage
    pub fn program(&self) -> Vec<Primitive> {
        self.program.iter().map(Primitive::from).collect()
    }

    /// Replace the program with a stored one.
    ///
    /// Strings naming a known operation become operations, any other string
    /// becomes a variable.
    ///
    /// ```
    /// use keycalc::{Engine, Primitive};
    ///
    /// let mut engine = Engine::new();
    /// engine.set_program(vec![
    ///     Primitive::Number(4.0),
    ///     Primitive::Text("√".into()),
    /// ]);
    /// assert_eq!(engine.evaluate().description, "√(4)");
    /// assert_eq!(engine.program(), vec![Primitive::Number(4.0), Primitive::Text("√".into())]);
    /// ```
    pub fn set_program<I>(&mut self, program: I)
    where
        I: IntoIterator<Item = Primitive>,
    {
        self.program = program
            .into_iter()
            .map(|primitive| {
                if let Primitive::Number(value) = primitive {
                    if !value.is_finite() {
                        warn!(value, "stored program holds a non-finite number");
                    }
                }
                Token::from(primitive)
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::{Engine, Evaluation};
    use crate::token::{Literal, Token};
    use std::collections::HashMap;
    use std::f64::consts::PI;

    fn press(engine: &mut Engine, keys: &[&str]) {
        for key in keys {
            match key.parse::<f64>() {
                Ok(value) => engine.set_operand(value),
                Err(_) => engine.perform_operation(key),
            }
        }
    }

    fn evaluated(keys: &[&str]) -> Evaluation {
        let mut engine = Engine::new();
        press(&mut engine, keys);
        engine.evaluate()
    }

    fn evaluation(result: Option<f64>, is_pending: bool, description: &str) -> Evaluation {
        Evaluation {
            result,
            is_pending,
            description: description.into(),
        }
    }

    #[test]
    fn addition() {
        assert_eq!(
            evaluated(&["7", "+", "3", "="]),
            evaluation(Some(10.0), false, "7+3")
        );
    }

    #[test]
    fn chained_operator_resolves_pending() {
        assert_eq!(
            evaluated(&["7", "+", "3", "+"]),
            evaluation(Some(10.0), true, "7+3+")
        );
    }

    #[test]
    fn unary_without_operand() {
        let mut engine = Engine::new();
        engine.perform_operation("√");
        assert_eq!(engine.evaluate(), evaluation(None, false, ""));
        assert!(engine.tokens().is_empty());
    }

    #[test]
    fn unary_wraps_whole_expression() {
        assert_eq!(evaluated(&["4", "√"]), evaluation(Some(2.0), false, "√(4)"));
        assert_eq!(
            evaluated(&["3", "+", "6", "=", "√"]),
            evaluation(Some(3.0), false, "√(3+6)")
        );
    }

    #[test]
    fn unary_wraps_second_operand() {
        assert_eq!(
            evaluated(&["3", "+", "4", "√"]),
            evaluation(Some(2.0), true, "3+√(4)")
        );
        assert_eq!(
            evaluated(&["3", "+", "4", "√", "="]),
            evaluation(Some(5.0), false, "3+√(4)")
        );
    }

    #[test]
    fn nested_unaries() {
        assert_eq!(
            evaluated(&["16", "√", "±"]),
            evaluation(Some(-4.0), false, "±(√(16))")
        );
    }

    #[test]
    fn variable_operand() {
        let mut engine = Engine::new();
        engine.set_variable("M", 5.0);
        engine.set_variable_operand("M");
        press(&mut engine, &["+", "3", "="]);
        assert_eq!(engine.evaluate(), evaluation(Some(8.0), false, "M+3"));
    }

    #[test]
    fn unbound_variable_is_zero() {
        let mut engine = Engine::new();
        engine.set_variable_operand("x");
        press(&mut engine, &["+", "3", "="]);
        assert_eq!(engine.evaluate(), evaluation(Some(3.0), false, "x+3"));
    }

    #[test]
    fn supplied_bindings_are_remembered() {
        let mut engine = Engine::new();
        engine.set_variable_operand("M");
        press(&mut engine, &["+", "3", "="]);

        let mut bindings: HashMap<String, f64> = HashMap::new();
        bindings.insert("M".into(), 5.0);
        assert_eq!(
            engine.evaluate_using(bindings),
            evaluation(Some(8.0), false, "M+3")
        );
        assert_eq!(engine.variable("M"), Some(5.0));
        assert_eq!(engine.evaluate().result, Some(8.0));

        // later keys keep the binding
        press(&mut engine, &["×", "2", "="]);
        assert_eq!(engine.evaluate().result, Some(16.0));
    }

    #[test]
    fn supplied_bindings_replace_previous_ones() {
        let mut engine = Engine::new();
        engine.set_variable("x", 1.0);
        engine.set_variable_operand("x");
        engine.evaluate_using(HashMap::new());
        assert_eq!(engine.variable("x"), None);
        assert_eq!(engine.evaluate().result, Some(0.0));
    }

    #[test]
    fn one_off_bindings_are_not_stored() {
        let mut engine = Engine::new();
        engine.set_variable_operand("M");
        press(&mut engine, &["×", "2", "="]);

        let mut context: HashMap<String, f64> = HashMap::new();
        context.insert("M".into(), 21.0);
        assert_eq!(engine.evaluate_with(&context).result, Some(42.0));
        assert_eq!(engine.variable("M"), None);
        assert_eq!(engine.evaluate().result, Some(0.0));
    }

    #[test]
    fn constant_as_second_operand() {
        assert_eq!(
            evaluated(&["5", "+", "π", "="]),
            evaluation(Some(5.0 + PI), false, "5+π")
        );
    }

    #[test]
    fn constant_starts_new_expression() {
        let mut engine = Engine::new();
        press(&mut engine, &["5", "+", "3", "=", "e"]);
        assert_eq!(
            engine.evaluate(),
            evaluation(Some(std::f64::consts::E), false, "e")
        );
        assert_eq!(engine.tokens(), &[Token::Operation("e".into())]);
    }

    #[test]
    fn operand_starts_new_expression() {
        let mut engine = Engine::new();
        press(&mut engine, &["5", "+", "3", "=", "9"]);
        assert_eq!(engine.evaluate(), evaluation(Some(9.0), false, "9"));
        assert_eq!(engine.tokens(), &[Token::Operand(Literal::Value(9.0))]);
    }

    #[test]
    fn continue_from_result() {
        assert_eq!(
            evaluated(&["5", "+", "3", "=", "×", "2", "="]),
            evaluation(Some(16.0), false, "5+3×2")
        );
    }

    #[test]
    fn strictly_left_to_right() {
        assert_eq!(evaluated(&["2", "+", "3", "×", "4", "="]).result, Some(20.0));
        assert_eq!(evaluated(&["9", "−", "4", "−", "2", "="]).result, Some(3.0));
    }

    #[test]
    fn repeated_binary_is_ignored() {
        let mut engine = Engine::new();
        press(&mut engine, &["7", "+", "×"]);
        assert_eq!(engine.tokens().len(), 2);
        assert_eq!(engine.evaluate(), evaluation(Some(7.0), true, "7+"));
    }

    #[test]
    fn equals_without_pending_is_ignored() {
        let mut engine = Engine::new();
        press(&mut engine, &["7", "="]);
        assert_eq!(engine.tokens().len(), 1);
        press(&mut engine, &["+", "="]);
        assert_eq!(engine.tokens().len(), 2);
        assert!(engine.evaluate().is_pending);
    }

    #[test]
    fn unknown_symbol_is_ignored() {
        let mut engine = Engine::new();
        press(&mut engine, &["7", "+"]);
        engine.perform_operation("mod");
        engine.perform_operation("-");
        assert_eq!(engine.tokens().len(), 2);
        assert_eq!(engine.evaluate(), evaluation(Some(7.0), true, "7+"));
    }

    #[test]
    fn floating_point_edges_propagate() {
        let evaluation = evaluated(&["1", "÷", "0", "="]);
        assert_eq!(evaluation.result, Some(f64::INFINITY));
        assert_eq!(evaluation.description, "1÷0");

        let evaluation = evaluated(&["4", "±", "√"]);
        assert!(evaluation.result.unwrap().is_nan());
        assert_eq!(evaluation.description, "√(±(4))");

        let evaluation = evaluated(&["0", "1/x", "+", "1", "="]);
        assert_eq!(evaluation.result, Some(f64::INFINITY));
        assert_eq!(evaluation.description, "1/x(0)+1");
    }

    #[test]
    fn random() {
        let mut engine = Engine::new();
        engine.perform_operation("Ran");
        let evaluation = engine.evaluate();
        assert!((0.0..1.0).contains(&evaluation.result.unwrap()));
        assert_eq!(evaluation.description, "Ran");

        press(&mut engine, &["+", "Ran", "="]);
        let evaluation = engine.evaluate();
        assert!((0.0..2.0).contains(&evaluation.result.unwrap()));
        assert_eq!(evaluation.description, "Ran+Ran");
    }

    #[test]
    fn evaluate_is_idempotent() {
        let mut engine = Engine::new();
        engine.set_variable("M", 2.5);
        press(&mut engine, &["3", "×"]);
        engine.set_variable_operand("M");
        press(&mut engine, &["=", "√", "+", "π"]);
        assert_eq!(engine.evaluate(), engine.evaluate());
    }

    #[test]
    fn undo_restores_previous_state() {
        let keys = ["7", "+", "3", "√", "×", "2", "=", "±"];
        for n in 1..keys.len() {
            let mut engine = Engine::new();
            press(&mut engine, &keys[..n]);
            let before = engine.evaluate();
            press(&mut engine, &keys[n..=n]);
            assert_eq!(engine.undo(), Some(before), "undoing {}", keys[n]);
        }
    }

    #[test]
    fn undo_step_by_step() {
        let mut engine = Engine::new();
        press(&mut engine, &["7", "+", "3", "="]);
        assert_eq!(engine.undo(), Some(evaluation(Some(3.0), true, "7+3")));
        assert_eq!(engine.undo(), Some(evaluation(Some(7.0), true, "7+")));
        assert_eq!(engine.undo(), Some(evaluation(Some(7.0), false, "7")));
        assert_eq!(engine.undo(), Some(evaluation(None, false, "")));
        assert_eq!(engine.undo(), None);
    }

    #[test]
    fn clear() {
        let mut engine = Engine::new();
        engine.set_variable("M", 1.0);
        press(&mut engine, &["7", "+"]);
        engine.clear();
        assert!(engine.tokens().is_empty());
        assert!(engine.variables().is_empty());
        assert_eq!(engine.evaluate(), evaluation(None, false, ""));
    }

    #[test]
    fn program_round_trip() {
        let mut engine = Engine::new();
        engine.set_variable("x", 3.0);
        press(&mut engine, &["2", "×"]);
        engine.set_variable_operand("x");
        press(&mut engine, &["=", "sin", "+", "0.25", "="]);
        let before = engine.evaluate();

        let program = engine.program();
        engine.set_program(program.clone());
        assert_eq!(engine.program(), program);
        assert_eq!(engine.evaluate(), before);
    }

    #[test]
    fn stored_program_is_replayed_as_keys() {
        use crate::token::Primitive;

        let mut engine = Engine::new();
        engine.set_program(vec![
            Primitive::Number(1.0),
            Primitive::Text("+".into()),
            Primitive::Number(2.0),
            Primitive::Text("=".into()),
            Primitive::Number(5.0),
        ]);
        assert_eq!(engine.evaluate(), evaluation(Some(5.0), false, "5"));
    }

    #[test]
    fn injected_formatter() {
        let mut engine = Engine::with_formatter(|x: f64| format!("[{}]", x));
        press(&mut engine, &["1.5", "+", "2", "="]);
        assert_eq!(engine.evaluate().description, "[1.5]+[2]");

        engine.set_formatter(crate::format::NumberFormatter::default());
        assert_eq!(engine.evaluate().description, "1.5+2");
        assert_eq!(engine.formatter().format(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn history_line() {
        assert_eq!(evaluated(&["7", "+"]).to_string(), "7+...");
        assert_eq!(evaluated(&["7", "+", "3", "="]).to_string(), "7+3=");
        assert_eq!(evaluated(&[]).to_string(), "");
    }
}
