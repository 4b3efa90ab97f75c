pub mod chatmodel;
pub mod jobmodel;
