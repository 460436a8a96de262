pub mod configure;
pub mod instructions;
pub mod run;
pub mod version;
