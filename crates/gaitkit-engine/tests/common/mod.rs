//! Synthetic gait tables for integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

use gaitkit_engine::table::{Column, Table};
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg64Mcg;

pub const POINTS: usize = 150;
pub const KNEE: &str = "knee_flexion_angle_rad";
pub const HIP_VELOCITY: &str = "hip_flexion_velocity_rad_s";
pub const ANKLE_MOMENT: &str = "ankle_moment_Nm_kg";

/// Phase position of point `i` within a cycle, in `[0, 1]`.
#[expect(clippy::cast_precision_loss)]
pub fn phase(i: usize) -> f64 {
    i as f64 / (POINTS - 1) as f64
}

/// Knee angle rising from 0 to 1.2 rad at mid-cycle and back.
pub fn knee_pattern(i: usize) -> f64 {
    1.2 * (PI * phase(i)).sin()
}

/// One group of consecutive cycles in a synthetic table.
#[derive(Debug, Clone)]
pub struct Group {
    pub subject: &'static str,
    pub task: &'static str,
    pub cycles: usize,
}

impl Group {
    pub fn new(subject: &'static str, task: &'static str, cycles: usize) -> Self {
        Self {
            subject,
            task,
            cycles,
        }
    }
}

/// Builds noisy gait cycles for each group.
///
/// Every cycle carries a knee angle, a hip velocity and an ankle moment with
/// Gaussian noise of standard deviation `noise`, plus a `phase` column in
/// percent.
#[derive(Debug)]
pub struct GaitGenerator {
    rng: Pcg64Mcg,
    noise: Normal<f64>,
}

impl GaitGenerator {
    pub fn new(seed: u64, noise: f64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
            noise: Normal::new(0.0, noise).unwrap(),
        }
    }

    pub fn table(&mut self, groups: &[Group]) -> Table {
        let mut subject = vec![];
        let mut task = vec![];
        let mut phase_percent = vec![];
        let mut knee = vec![];
        let mut hip = vec![];
        let mut ankle = vec![];

        for group in groups {
            for _ in 0..group.cycles {
                let amplitude = 1.0 + self.rng.sample(self.noise);
                for i in 0..POINTS {
                    subject.push(group.subject.to_string());
                    task.push(group.task.to_string());
                    phase_percent.push(100.0 * phase(i));
                    knee.push(amplitude * knee_pattern(i) + self.rng.sample(self.noise));
                    hip.push(2.0 * (2.0 * PI * phase(i)).cos() + self.rng.sample(self.noise));
                    ankle.push(50.0 * (PI * phase(i)).sin() + 10.0 * self.rng.sample(self.noise));
                }
            }
        }

        Table::new(vec![
            ("subject".into(), Column::Text(subject)),
            ("task".into(), Column::Text(task)),
            ("phase".into(), Column::Numeric(phase_percent)),
            (KNEE.into(), Column::Numeric(knee)),
            (HIP_VELOCITY.into(), Column::Numeric(hip)),
            (ANKLE_MOMENT.into(), Column::Numeric(ankle)),
        ])
        .unwrap()
    }
}

/// Noise-free two-cycle S1/T1 table with a single knee angle feature.
pub fn two_cycle_knee_table() -> Table {
    let rows = 2 * POINTS;
    let knee = (0..rows).map(|row| knee_pattern(row % POINTS)).collect();
    Table::new(vec![
        ("subject".into(), Column::Text(vec!["S1".into(); rows])),
        ("task".into(), Column::Text(vec!["T1".into(); rows])),
        (KNEE.into(), Column::Numeric(knee)),
    ])
    .unwrap()
}
