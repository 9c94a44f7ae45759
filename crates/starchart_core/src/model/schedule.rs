//! Weekly schedule domain model.
//!
//! # Responsibility
//! - Define the canonical Day/Task/Schedule shapes stored as one document.
//! - Provide immutable update helpers (toggle, reset) and derived counts.
//!
//! # Invariants
//! - A schedule holds exactly 7 days with exactly 8 tasks each.
//! - Task ids are `"{day_id}-{index}"` and never change after creation.
//! - Cosmetic tags are present iff the task is completed.
//!
//! # See also
//! - `store::payload` for the persisted document shape.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Day names in display order. The week starts on Sunday.
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Canonical chores replicated on every day.
pub const COMMON_TASKS: [&str; 8] = [
    "Get Dressed Without Fuss",
    "Brush Teeth (Morning)",
    "Eat Breakfast Nicely",
    "Clean Up Toys",
    "Eat Dinner Nicely",
    "Brush Teeth (Evening)",
    "Bath Time Without Fuss",
    "Get Ready for Bed Calmly",
];

pub const DAYS_PER_WEEK: usize = DAYS_OF_WEEK.len();
pub const TASKS_PER_DAY: usize = COMMON_TASKS.len();
/// Upper bound of `Schedule::total_stars`.
pub const MAX_STARS: u32 = (DAYS_PER_WEEK * TASKS_PER_DAY) as u32;

const WEEKEND_DAY_IDS: [&str; 2] = ["sunday", "saturday"];

/// Star color variant assigned when a task is completed.
///
/// Wire values are the class strings written by the browser client, so
/// documents stay readable by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarColor {
    #[serde(rename = "text-yellow-400 fill-yellow-400")]
    Yellow,
    #[serde(rename = "text-orange-500 fill-orange-500")]
    Orange,
    #[serde(rename = "text-pink-500 fill-pink-500")]
    Pink,
    #[serde(rename = "text-purple-500 fill-purple-500")]
    Purple,
    #[serde(rename = "text-teal-500 fill-teal-500")]
    Teal,
    #[serde(rename = "text-lime-500 fill-lime-500")]
    Lime,
}

impl StarColor {
    pub const ALL: [StarColor; 6] = [
        StarColor::Yellow,
        StarColor::Orange,
        StarColor::Pink,
        StarColor::Purple,
        StarColor::Teal,
        StarColor::Lime,
    ];

    /// Returns the wire/class value of this variant.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Yellow => "text-yellow-400 fill-yellow-400",
            Self::Orange => "text-orange-500 fill-orange-500",
            Self::Pink => "text-pink-500 fill-pink-500",
            Self::Purple => "text-purple-500 fill-purple-500",
            Self::Teal => "text-teal-500 fill-teal-500",
            Self::Lime => "text-lime-500 fill-lime-500",
        }
    }
}

/// Bounce animation speed assigned when a task is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BounceSpeed {
    #[serde(rename = "animate-bounce")]
    Normal,
    #[serde(rename = "animate-bounce-slow")]
    Slow,
    #[serde(rename = "animate-bounce-mediumfast")]
    MediumFast,
    #[serde(rename = "animate-bounce-fast")]
    Fast,
}

impl BounceSpeed {
    pub const ALL: [BounceSpeed; 4] = [
        BounceSpeed::Normal,
        BounceSpeed::Slow,
        BounceSpeed::MediumFast,
        BounceSpeed::Fast,
    ];

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Normal => "animate-bounce",
            Self::Slow => "animate-bounce-slow",
            Self::MediumFast => "animate-bounce-mediumfast",
            Self::Fast => "animate-bounce-fast",
        }
    }
}

/// Pair of cosmetic tags carried by a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmeticTags {
    pub color: StarColor,
    pub bounce_speed: BounceSpeed,
}

impl CosmeticTags {
    /// Tags used when a completed task arrives without any.
    pub const FALLBACK: CosmeticTags = CosmeticTags {
        color: StarColor::Yellow,
        bounce_speed: BounceSpeed::Normal,
    };
}

/// One chore on one day.
///
/// Optional tag fields always serialize as explicit `null`; the document
/// store rejects omitted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub completed: bool,
    #[serde(rename = "starColorClass", default)]
    pub star_color: Option<StarColor>,
    #[serde(rename = "starBounceSpeedClass", default)]
    pub bounce_speed: Option<BounceSpeed>,
}

impl Task {
    /// Creates an incomplete task without cosmetic tags.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: false,
            star_color: None,
            bounce_speed: None,
        }
    }

    /// Marks this task completed and attaches `tags`.
    pub fn mark_completed(&mut self, tags: CosmeticTags) {
        self.completed = true;
        self.star_color = Some(tags.color);
        self.bounce_speed = Some(tags.bounce_speed);
    }

    /// Marks this task incomplete and clears both tags.
    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.star_color = None;
        self.bounce_speed = None;
    }

    /// Returns tags when both are set.
    pub fn cosmetic_tags(&self) -> Option<CosmeticTags> {
        match (self.star_color, self.bounce_speed) {
            (Some(color), Some(bounce_speed)) => Some(CosmeticTags {
                color,
                bounce_speed,
            }),
            _ => None,
        }
    }

    pub fn has_consistent_tags(&self) -> bool {
        if self.completed {
            self.star_color.is_some() && self.bounce_speed.is_some()
        } else {
            self.star_color.is_none() && self.bounce_speed.is_none()
        }
    }

    fn repair_cosmetics(&mut self) -> bool {
        if self.has_consistent_tags() {
            return false;
        }
        if self.completed {
            let color = self.star_color.unwrap_or(CosmeticTags::FALLBACK.color);
            let bounce_speed = self
                .bounce_speed
                .unwrap_or(CosmeticTags::FALLBACK.bounce_speed);
            self.mark_completed(CosmeticTags {
                color,
                bounce_speed,
            });
        } else {
            self.mark_incomplete();
        }
        true
    }
}

/// One day column of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    #[serde(rename = "dayName")]
    pub day_name: String,
    pub tasks: Vec<Task>,
}

impl Day {
    /// Builds the default day for `day_name` with all canonical chores.
    pub fn with_common_tasks(day_name: &str) -> Self {
        let id = day_name.to_ascii_lowercase();
        let tasks = COMMON_TASKS
            .iter()
            .enumerate()
            .map(|(index, name)| Task::new(task_id(&id, index), *name))
            .collect();
        Self {
            id,
            day_name: day_name.to_string(),
            tasks,
        }
    }

    pub fn is_weekend(&self) -> bool {
        WEEKEND_DAY_IDS.contains(&self.id.as_str())
    }

    pub fn completed_count(&self) -> u32 {
        self.tasks.iter().filter(|task| task.completed).count() as u32
    }

    /// Restores the tag invariant on every task of this day.
    ///
    /// Completed tasks missing a tag get `CosmeticTags::FALLBACK` values;
    /// incomplete tasks lose any stray tag. Returns the number of tasks
    /// changed.
    pub fn repair_cosmetics(&mut self) -> usize {
        self.tasks
            .iter_mut()
            .map(Task::repair_cosmetics)
            .filter(|changed| *changed)
            .count()
    }
}

/// Derives the stable task id for `index` within `day_id`.
pub fn task_id(day_id: &str, index: usize) -> String {
    format!("{day_id}-{index}")
}

/// Shape violation found while validating a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleValidationError {
    DayCount { found: usize },
    TaskCount { day_id: String, found: usize },
    DuplicateDay(String),
    UnexpectedTaskId {
        day_id: String,
        index: usize,
        found: String,
    },
    InconsistentTags { task_id: String },
}

impl Display for ScheduleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayCount { found } => {
                write!(f, "schedule must have {DAYS_PER_WEEK} days, found {found}")
            }
            Self::TaskCount { day_id, found } => write!(
                f,
                "day `{day_id}` must have {TASKS_PER_DAY} tasks, found {found}"
            ),
            Self::DuplicateDay(day_id) => write!(f, "day `{day_id}` appears more than once"),
            Self::UnexpectedTaskId {
                day_id,
                index,
                found,
            } => write!(
                f,
                "task {index} of day `{day_id}` must have id `{}`, found `{found}`",
                task_id(day_id, *index)
            ),
            Self::InconsistentTags { task_id } => write!(
                f,
                "task `{task_id}` cosmetic tags do not match its completion state"
            ),
        }
    }
}

impl Error for ScheduleValidationError {}

/// Lookup failure for schedule mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    DayNotFound(String),
    TaskNotFound { day_id: String, task_id: String },
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayNotFound(day_id) => write!(f, "day not found: {day_id}"),
            Self::TaskNotFound { day_id, task_id } => {
                write!(f, "task not found: {task_id} (day {day_id})")
            }
        }
    }
}

impl Error for ScheduleError {}

/// Full week of days, the unit of persistence.
///
/// Instances are only created through `default_week` or the validating
/// `from_days`, so every value satisfies the module invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    days: Vec<Day>,
}

impl Schedule {
    /// Builds the default week: 7 days, 8 incomplete tasks each.
    pub fn default_week() -> Self {
        Self {
            days: DAYS_OF_WEEK
                .iter()
                .map(|day_name| Day::with_common_tasks(day_name))
                .collect(),
        }
    }

    /// Wraps `days` after checking every shape invariant.
    pub fn from_days(days: Vec<Day>) -> Result<Self, ScheduleValidationError> {
        let schedule = Self { days };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        if self.days.len() != DAYS_PER_WEEK {
            return Err(ScheduleValidationError::DayCount {
                found: self.days.len(),
            });
        }

        let mut seen = HashSet::new();
        for day in &self.days {
            if !seen.insert(day.id.as_str()) {
                return Err(ScheduleValidationError::DuplicateDay(day.id.clone()));
            }
            if day.tasks.len() != TASKS_PER_DAY {
                return Err(ScheduleValidationError::TaskCount {
                    day_id: day.id.clone(),
                    found: day.tasks.len(),
                });
            }
            for (index, task) in day.tasks.iter().enumerate() {
                if task.id != task_id(&day.id, index) {
                    return Err(ScheduleValidationError::UnexpectedTaskId {
                        day_id: day.id.clone(),
                        index,
                        found: task.id.clone(),
                    });
                }
                if !task.has_consistent_tags() {
                    return Err(ScheduleValidationError::InconsistentTags {
                        task_id: task.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn into_days(self) -> Vec<Day> {
        self.days
    }

    pub fn day(&self, day_id: &str) -> Option<&Day> {
        self.days.iter().find(|day| day.id == day_id)
    }

    pub fn task(&self, day_id: &str, task_id: &str) -> Option<&Task> {
        self.day(day_id)?
            .tasks
            .iter()
            .find(|task| task.id == task_id)
    }

    /// Count of completed tasks across all days.
    pub fn total_stars(&self) -> u32 {
        self.days.iter().map(Day::completed_count).sum()
    }

    /// Returns a new schedule with one task's completion flipped.
    ///
    /// `pick_tags` is only invoked when the task becomes completed.
    pub fn toggle_task(
        &self,
        day_id: &str,
        task_id: &str,
        pick_tags: impl FnOnce() -> CosmeticTags,
    ) -> Result<Schedule, ScheduleError> {
        let day_index = self
            .days
            .iter()
            .position(|day| day.id == day_id)
            .ok_or_else(|| ScheduleError::DayNotFound(day_id.to_string()))?;
        let task_index = self.days[day_index]
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound {
                day_id: day_id.to_string(),
                task_id: task_id.to_string(),
            })?;

        let mut next = self.clone();
        let task = &mut next.days[day_index].tasks[task_index];
        if task.completed {
            task.mark_incomplete();
        } else {
            task.mark_completed(pick_tags());
        }
        Ok(next)
    }

    /// Returns a copy with every task incomplete and untagged.
    pub fn reset(&self) -> Schedule {
        let mut next = self.clone();
        next.days
            .iter_mut()
            .flat_map(|day| day.tasks.iter_mut())
            .for_each(Task::mark_incomplete);
        next
    }

    /// Days shown when weekends are hidden.
    pub fn weekdays(&self) -> Vec<&Day> {
        self.days.iter().filter(|day| !day.is_weekend()).collect()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::default_week()
    }
}
