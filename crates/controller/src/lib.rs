pub mod argsplit;
pub mod commands;
pub mod fanout;
pub mod jobid;
pub mod poll;
