// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recommendation generation and lookup.
//!
//! Generation is a pure function of one activity. The default generator
//! grades intensity by calories burned per minute and layers per-type
//! advice on top.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityType, Recommendation};
use chrono::Utc;

/// Heart rate above which a safety note is added.
const HIGH_HEART_RATE_BPM: f64 = 170.0;
/// Sessions shorter than this get a "go longer" improvement.
const SHORT_SESSION_MINUTES: u32 = 20;
/// Sessions longer than this get a pacing improvement.
const LONG_SESSION_MINUTES: u32 = 90;

/// Turns an activity into a recommendation.
pub trait RecommendationGenerator: Send + Sync {
    fn generate(&self, activity: &Activity) -> Recommendation;
}

/// Effort bands by calories burned per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    VeryLow,
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn from_calories_per_minute(cpm: f64) -> Self {
        if cpm >= 15.0 {
            Intensity::High
        } else if cpm >= 10.0 {
            Intensity::Medium
        } else if cpm >= 5.0 {
            Intensity::Low
        } else {
            Intensity::VeryLow
        }
    }

    fn label(self) -> &'static str {
        match self {
            Intensity::VeryLow => "very low",
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

/// Calories per minute, or zero for a zero-length activity.
pub fn calories_per_minute(activity: &Activity) -> f64 {
    if activity.duration == 0 {
        0.0
    } else {
        f64::from(activity.calories_burned) / f64::from(activity.duration)
    }
}

/// Default rule-based generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityAdvisor;

impl RecommendationGenerator for IntensityAdvisor {
    fn generate(&self, activity: &Activity) -> Recommendation {
        let cpm = calories_per_minute(activity);
        let intensity = Intensity::from_calories_per_minute(cpm);

        let summary = format!(
            "{} session of {} minutes burning {} kcal ({:.1} kcal/min), {} intensity. {}",
            activity_name(activity.activity_type),
            activity.duration,
            activity.calories_burned,
            cpm,
            intensity.label(),
            intensity_summary(intensity)
        );

        Recommendation {
            id: String::new(),
            activity_id: activity.id.clone(),
            user_id: activity.user_id.clone(),
            activity_type: activity.activity_type,
            recommendation: summary,
            improvements: improvements(activity, intensity),
            suggestions: suggestions(activity.activity_type),
            safety: safety(activity, intensity),
            created_at: Utc::now(),
        }
    }
}

fn activity_name(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Running => "Running",
        ActivityType::Walking => "Walking",
        ActivityType::Cycling => "Cycling",
        ActivityType::Swimming => "Swimming",
        ActivityType::WeightTraining => "Weight training",
        ActivityType::Yoga => "Yoga",
        ActivityType::Hiit => "HIIT",
        ActivityType::Cardio => "Cardio",
        ActivityType::Stretching => "Stretching",
        ActivityType::Other => "Workout",
    }
}

fn intensity_summary(intensity: Intensity) -> &'static str {
    match intensity {
        Intensity::High => "A demanding effort; make sure recovery keeps up with it.",
        Intensity::Medium => "A solid training stimulus you can build on.",
        Intensity::Low => "A comfortable effort, good for base building and recovery.",
        Intensity::VeryLow => "A light session; there is room to push harder when you feel ready.",
    }
}

fn improvements(activity: &Activity, intensity: Intensity) -> Vec<String> {
    let mut out = Vec::new();

    match intensity {
        Intensity::VeryLow | Intensity::Low => out.push(
            "Add short intervals at a higher pace or resistance to raise your calorie burn."
                .to_string(),
        ),
        Intensity::Medium => out.push(
            "Try adding one harder block each week to keep progressing.".to_string(),
        ),
        Intensity::High => out.push(
            "Alternate hard sessions with easy days so the effort turns into fitness.".to_string(),
        ),
    }

    if activity.duration < SHORT_SESSION_MINUTES {
        out.push(format!(
            "Work towards sessions of at least {} minutes for better endurance gains.",
            SHORT_SESSION_MINUTES
        ));
    } else if activity.duration > LONG_SESSION_MINUTES {
        out.push("Plan fuelling and pacing for sessions this long.".to_string());
    }

    out
}

fn suggestions(activity_type: ActivityType) -> Vec<String> {
    let specific = match activity_type {
        ActivityType::Running => "Mix an easy long run with one tempo run per week.",
        ActivityType::Walking => "Add hills or a brisker pace to part of your walk.",
        ActivityType::Cycling => "Include a cadence drill to make pedalling more efficient.",
        ActivityType::Swimming => "Alternate technique drills with steady distance sets.",
        ActivityType::WeightTraining => "Track your lifts and increase load gradually.",
        ActivityType::Yoga => "Hold key poses a few breaths longer to build strength.",
        ActivityType::Hiit => "Keep work intervals sharp and rest intervals honest.",
        ActivityType::Cardio => "Vary machines or classes to avoid plateaus.",
        ActivityType::Stretching => "Pair stretching with your hardest training days.",
        ActivityType::Other => "Keep a consistent weekly schedule for this activity.",
    };

    vec![
        specific.to_string(),
        "Log how you felt after each session to spot trends.".to_string(),
    ]
}

fn safety(activity: &Activity, intensity: Intensity) -> Vec<String> {
    let mut out = vec!["Stay hydrated before, during and after exercise.".to_string()];

    match activity.activity_type {
        ActivityType::Running | ActivityType::Walking => {
            out.push("Wear supportive footwear and watch uneven ground.".to_string())
        }
        ActivityType::Cycling => out.push("Wear a helmet and use lights in low visibility.".to_string()),
        ActivityType::Swimming => out.push("Swim where a lifeguard or buddy is present.".to_string()),
        ActivityType::WeightTraining => {
            out.push("Use a spotter or safeties for heavy lifts.".to_string())
        }
        _ => {}
    }

    if intensity == Intensity::High {
        out.push("Warm up properly and cool down after high-intensity work.".to_string());
    }

    let peak_heart_rate = ["maxHeartRate", "heartRate", "avgHeartRate"]
        .iter()
        .filter_map(|key| activity.additional_metrics.get(*key))
        .filter_map(|value| value.as_f64())
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));

    if peak_heart_rate.is_some_and(|bpm| bpm > HIGH_HEART_RATE_BPM) {
        out.push(format!(
            "Heart rate above {} bpm was recorded; check with a professional if that is unusual for you.",
            HIGH_HEART_RATE_BPM
        ));
    }

    out
}

/// Read access to stored recommendations.
#[derive(Clone)]
pub struct RecommendationService {
    db: Db,
}

impl RecommendationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn user_recommendations(&self, user_id: &str) -> Result<Vec<Recommendation>> {
        self.db.recommendations_for_user(user_id).await
    }

    pub async fn activity_recommendation(&self, activity_id: &str) -> Result<Recommendation> {
        self.db
            .recommendation_for_activity(activity_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No recommendation found for activity {}", activity_id))
            })
    }
}
