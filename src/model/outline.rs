//! Percentage-weighted story outline.
//!
//! An [`Outline`] is a tree of [`Act`]s. Every act is either a branch that
//! splits its share of the story among sub-acts, or a leaf that owns the ids
//! of the scene-sequel units written for it. The two shapes are separate
//! variants of [`ActBody`], so an act can never carry both, and input that
//! lists both is rejected while parsing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Allowed drift when comparing percentage sums.
pub const PERCENT_TOLERANCE: f64 = 0.01;

/// Top-level structure of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Structure label, e.g. "three_act" or "heros_journey".
    pub structure_type: String,
    pub acts: Vec<Act>,
}

/// A named, weighted segment of the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAct")]
pub struct Act {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// How this generic beat plays out in this particular story.
    #[serde(default)]
    pub story_specific: String,
    /// Share of the total story length, 0.0 to 1.0.
    pub percentage: f64,
    /// Position among siblings.
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub body: ActBody,
}

/// Contents of an act: sub-acts or owned unit ids, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActBody {
    SubActs(Vec<Act>),
    SceneSequels(Vec<String>),
}

/// Wire shape of an [`Act`], with both bodies optional so that an act
/// listing both (or neither) is rejected instead of losing one silently.
#[derive(Deserialize)]
struct RawAct {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    story_specific: String,
    percentage: f64,
    #[serde(default)]
    order: u32,
    sub_acts: Option<Vec<Act>>,
    scene_sequels: Option<Vec<String>>,
}

impl TryFrom<RawAct> for Act {
    type Error = Error;

    fn try_from(raw: RawAct) -> Result<Self> {
        let body = match (raw.sub_acts, raw.scene_sequels) {
            (Some(children), None) => ActBody::SubActs(children),
            (None, Some(ids)) => ActBody::SceneSequels(ids),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidOutline(format!(
                    "act '{}' has both sub_acts and scene_sequels",
                    raw.title
                )));
            }
            (None, None) => {
                return Err(Error::InvalidOutline(format!(
                    "act '{}' has neither sub_acts nor scene_sequels",
                    raw.title
                )));
            }
        };
        Ok(Self {
            title: raw.title,
            description: raw.description,
            story_specific: raw.story_specific,
            percentage: raw.percentage,
            order: raw.order,
            body,
        })
    }
}

impl Act {
    /// Create a terminal act owning the given unit ids.
    pub fn leaf(title: impl Into<String>, percentage: f64, unit_ids: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            story_specific: String::new(),
            percentage,
            order: 0,
            body: ActBody::SceneSequels(unit_ids),
        }
    }

    /// Create a non-terminal act splitting its share among `children`.
    pub fn branch(title: impl Into<String>, percentage: f64, children: Vec<Act>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            story_specific: String::new(),
            percentage,
            order: 0,
            body: ActBody::SubActs(children),
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.body, ActBody::SceneSequels(_))
    }

    /// Sub-acts sorted by their order index (empty for terminal acts).
    pub fn sub_acts(&self) -> Vec<&Act> {
        match &self.body {
            ActBody::SubActs(children) => sorted(children),
            ActBody::SceneSequels(_) => Vec::new(),
        }
    }

    /// Unit ids owned by this act (empty for non-terminal acts).
    pub fn unit_ids(&self) -> &[String] {
        match &self.body {
            ActBody::SceneSequels(ids) => ids,
            ActBody::SubActs(_) => &[],
        }
    }

    /// Check the percentage range, the child-sum rule and non-emptiness for
    /// this act and everything below it.
    pub fn validate(&self) -> Result<()> {
        if !self.percentage.is_finite() || !(0.0..=1.0).contains(&self.percentage) {
            return Err(Error::InvalidOutline(format!(
                "act '{}' has percentage {} outside [0, 1]",
                self.title, self.percentage
            )));
        }

        match &self.body {
            ActBody::SceneSequels(ids) => {
                if ids.is_empty() {
                    return Err(Error::InvalidOutline(format!(
                        "act '{}' has neither sub-acts nor units",
                        self.title
                    )));
                }
            }
            ActBody::SubActs(children) => {
                if children.is_empty() {
                    return Err(Error::InvalidOutline(format!(
                        "act '{}' has neither sub-acts nor units",
                        self.title
                    )));
                }
                let sum: f64 = children.iter().map(|c| c.percentage).sum();
                if (sum - self.percentage).abs() > PERCENT_TOLERANCE {
                    return Err(Error::InvalidOutline(format!(
                        "sub-acts of '{}' sum to {:.3}, expected {:.3}",
                        self.title, sum, self.percentage
                    )));
                }
                for child in children {
                    child.validate()?;
                }
            }
        }

        Ok(())
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Act>) {
        match &self.body {
            ActBody::SceneSequels(_) => out.push(self),
            ActBody::SubActs(children) => {
                for child in sorted(children) {
                    child.collect_leaves(out);
                }
            }
        }
    }

    fn find<'a>(&'a self, title: &str) -> Option<&'a Act> {
        if self.title == title {
            return Some(self);
        }
        match &self.body {
            ActBody::SubActs(children) => children.iter().find_map(|c| c.find(title)),
            ActBody::SceneSequels(_) => None,
        }
    }
}

impl Outline {
    pub fn new(structure_type: impl Into<String>, acts: Vec<Act>) -> Self {
        Self {
            structure_type: structure_type.into(),
            acts,
        }
    }

    /// Validate the whole tree: top-level shares sum to 1.0 and every act
    /// satisfies [`Act::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.acts.is_empty() {
            return Err(Error::InvalidOutline("outline has no acts".to_string()));
        }
        let sum: f64 = self.acts.iter().map(|a| a.percentage).sum();
        if (sum - 1.0).abs() > PERCENT_TOLERANCE {
            return Err(Error::InvalidOutline(format!(
                "top-level acts sum to {:.3}, expected 1.0",
                sum
            )));
        }
        for act in &self.acts {
            act.validate()?;
        }
        Ok(())
    }

    /// Terminal acts in reading order.
    pub fn leaf_acts(&self) -> Vec<&Act> {
        let mut leaves = Vec::new();
        for act in sorted(&self.acts) {
            act.collect_leaves(&mut leaves);
        }
        leaves
    }

    /// All unit ids in reading order.
    pub fn unit_ids(&self) -> Vec<&str> {
        self.leaf_acts()
            .into_iter()
            .flat_map(|act| act.unit_ids().iter().map(String::as_str))
            .collect()
    }

    /// Title of the terminal act that owns `unit_id`.
    pub fn act_for_unit(&self, unit_id: &str) -> Option<&str> {
        self.leaf_acts()
            .into_iter()
            .find(|act| act.unit_ids().iter().any(|id| id == unit_id))
            .map(|act| act.title.as_str())
    }

    /// Depth-first lookup by title.
    pub fn find_act(&self, title: &str) -> Option<&Act> {
        self.acts.iter().find_map(|a| a.find(title))
    }
}

fn sorted(acts: &[Act]) -> Vec<&Act> {
    let mut refs: Vec<&Act> = acts.iter().collect();
    // Stable, so equal indices keep their listed order.
    refs.sort_by_key(|a| a.order);
    refs
}
