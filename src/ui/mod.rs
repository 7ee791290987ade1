//! egui rendering of the dashboard: sidebar controls and the scatter plot.

pub mod panels;
pub mod plot;
