pub mod oracles;
pub mod score;
pub mod worker;
