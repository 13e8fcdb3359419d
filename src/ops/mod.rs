pub mod seamless;
