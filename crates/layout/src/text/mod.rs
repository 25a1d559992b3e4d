pub mod shaper;
