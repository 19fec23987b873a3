pub mod verses;
