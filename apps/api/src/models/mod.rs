pub mod evaluation;
pub mod recommendation;
pub mod run;
