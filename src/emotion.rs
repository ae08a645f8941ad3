// The emotions the player is asked to act out, in game order

/// Everything the game needs to know about one emotion step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmotionSpec {
    pub emotion: Emotion,
    /// Key of this emotion in the classifier output
    pub label: &'static str,
    /// Prompt shown while the step is running
    pub directions: &'static str,
    /// Base name of the reference image in the assets directory
    pub asset: &'static str,
}

/// Emotion requested from the player. Declaration order is game order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    Happiness,
    Anger,
    Sadness,
}

const EMOTION_TABLE: [EmotionSpec; 3] = [
    EmotionSpec {
        emotion: Emotion::Happiness,
        label: "Happy",
        directions: "Show me your happy face!",
        asset: "happiness",
    },
    EmotionSpec {
        emotion: Emotion::Anger,
        label: "Angry",
        directions: "Now show me... Anger!",
        asset: "anger",
    },
    EmotionSpec {
        emotion: Emotion::Sadness,
        label: "Sad",
        directions: "OK, how about Sadness?",
        asset: "sadness",
    },
];

impl Emotion {
    /// All emotions in the order they are played
    pub const ALL: [Emotion; 3] = [Emotion::Happiness, Emotion::Anger, Emotion::Sadness];

    /// The emotion every session starts with
    pub const fn first() -> Self {
        Emotion::Happiness
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static EmotionSpec {
        &EMOTION_TABLE[self.index()]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn directions(self) -> &'static str {
        self.spec().directions
    }

    pub fn asset(self) -> &'static str {
        self.spec().asset
    }

    /// The emotion after this one, or `None` once the game is over
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Finds the emotion for a classifier label
    pub fn from_label(label: &str) -> Option<Self> {
        EMOTION_TABLE
            .iter()
            .find(|spec| spec.label == label)
            .map(|spec| spec.emotion)
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Emotion::Happiness => "Happiness",
            Emotion::Anger => "Anger",
            Emotion::Sadness => "Sadness",
        };
        write!(f, "{name}")
    }
}
