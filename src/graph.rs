use crate::engine::Engine;
use tracing::trace;

impl Engine {
    /// Check if the program can be drawn as a curve: something was entered
    /// and no operation is waiting for an operand.
    pub fn is_plottable(&self) -> bool {
        !self.tokens().is_empty() && !self.is_pending()
    }

    /// Evaluate the program once per `x`, with `variable` bound to `x`.
    ///
    /// Other variables keep the engine's bindings. Points where the result is
    /// missing or not finite come out as `None`.
    ///
    /// ```
    /// use keycalc::Engine;
    ///
    /// let mut engine = Engine::new();
    /// engine.set_variable_operand("M");
    /// engine.perform_operation("×");
    /// engine.set_operand(2.0);
    /// engine.perform_operation("=");
    ///
    /// let points: Vec<_> = engine.plot("M", vec![0.0, 1.5]).collect();
    /// assert_eq!(points, vec![(0.0, Some(0.0)), (1.5, Some(3.0))]);
    /// ```
    pub fn plot<'a, I>(
        &'a self,
        variable: &'a str,
        xs: I,
    ) -> impl Iterator<Item = (f64, Option<f64>)> + 'a
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: 'a,
    {
        let mut context = self.variables().clone();
        xs.into_iter().map(move |x| {
            context.insert(variable.to_owned(), x);
            let y = self.evaluate_with(&context).result.filter(|y| y.is_finite());
            trace!(x, ?y, "plotted point");
            (x, y)
        })
    }
}
