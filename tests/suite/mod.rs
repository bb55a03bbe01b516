mod determinism;
mod lifecycle;
