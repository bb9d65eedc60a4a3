pub mod mmi;
