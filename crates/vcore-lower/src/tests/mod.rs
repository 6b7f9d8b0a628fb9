pub mod helpers;

mod returns;
