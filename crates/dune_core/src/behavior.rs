use serde::Deserialize;

/// Discrete movement mode of the character. Each mode fixes both the scroll
/// speed of the world and the animation clip that plays.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Character stands still; the obstacle field and ground are frozen.
    Idle,
    #[default]
    Walk,
    Run,
}

impl Behavior {
    /// All behaviors in display order.
    pub const ALL: &'static [Behavior] = &[Behavior::Idle, Behavior::Walk, Behavior::Run];

    /// World units per second that obstacles and ground travel toward the viewer.
    pub fn speed(self) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Walk => 2.0,
            Self::Run => 4.0,
        }
    }

    /// Index into the character's clip catalog.
    pub fn clip_index(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Walk => 1,
            Self::Run => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Walk => "Walk",
            Self::Run => "Run",
        }
    }
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lighting preset for the whole scene.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Day,
    Night,
}

impl TimeOfDay {
    pub const ALL: &'static [TimeOfDay] = &[TimeOfDay::Day, TimeOfDay::Night];

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Night => "Night",
        }
    }

    /// The other preset.
    pub fn toggled(self) -> Self {
        match self {
            Self::Day => Self::Night,
            Self::Night => Self::Day,
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_behavior_is_walk() {
        assert_eq!(Behavior::default(), Behavior::Walk);
    }

    #[test]
    fn speeds_are_non_negative_and_ordered() {
        for &behavior in Behavior::ALL {
            assert!(behavior.speed() >= 0.0);
        }
        assert_eq!(Behavior::Idle.speed(), 0.0);
        assert!(Behavior::Walk.speed() < Behavior::Run.speed());
        assert_eq!(Behavior::Run.speed(), 4.0);
    }

    #[test]
    fn clip_indices_are_distinct() {
        let indices: Vec<usize> = Behavior::ALL.iter().map(|b| b.clip_index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn display_matches_label() {
        for &behavior in Behavior::ALL {
            assert_eq!(format!("{}", behavior), behavior.label());
        }
        for &mode in TimeOfDay::ALL {
            assert_eq!(format!("{}", mode), mode.label());
        }
    }

    #[test]
    fn toggled_flips_between_presets() {
        assert_eq!(TimeOfDay::Day.toggled(), TimeOfDay::Night);
        assert_eq!(TimeOfDay::Night.toggled(), TimeOfDay::Day);
        assert_eq!(TimeOfDay::Day.toggled().toggled(), TimeOfDay::Day);
    }

    #[test]
    fn deserializes_lowercase_names() {
        let behavior: Behavior = serde_json::from_str("\"run\"").expect("parse behavior");
        assert_eq!(behavior, Behavior::Run);
        let mode: TimeOfDay = serde_json::from_str("\"night\"").expect("parse mode");
        assert_eq!(mode, TimeOfDay::Night);
    }
}
