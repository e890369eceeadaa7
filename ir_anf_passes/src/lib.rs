use ir_anf::Program;

mod cse;

pub use cse::{cse_key, CommonSubexpressionElimination, CseKey};

pub trait AnfPass {
    fn name(&self) -> &'static str;

    /// Rewrites `program`. Passes keep no state from one program to the next.
    fn run_pass(&mut self, program: Program) -> Program;
}

/// The passes run by default, in order.
pub fn default_passes() -> Vec<Box<dyn AnfPass>> {
    vec![Box::new(CommonSubexpressionElimination::new())]
}

pub fn run_passes(mut program: Program, passes: &mut [Box<dyn AnfPass>]) -> Program {
    for pass in passes {
        log::debug!("running pass `{}`", pass.name());
        program = pass.run_pass(program);
        log::trace!("after `{}`:\n{program}", pass.name());
    }
    program
}
