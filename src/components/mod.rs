pub mod form;
pub mod phase_board;
