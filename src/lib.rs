//! Learning PDDL action models from execution logs.
//!
//! [`pddl`] reads domain and problem files, [`learning`] grounds literal spaces and projects
//! observed states onto an action's parameters, and [`dataset`] reads and writes the logs.

pub mod dataset;
pub mod learning;
pub mod pddl;
