/// The nine SCUMM-style verbs, laid out as a 3x3 button grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Give,
    PickUp,
    Use,
    Open,
    LookAt,
    Push,
    Close,
    TalkTo,
    Pull,
}

pub const VERB_GRID_COLUMNS: usize = 3;

impl Verb {
    /// Row-major grid order.
    pub const ALL: [Verb; 9] = [
        Verb::Give,
        Verb::PickUp,
        Verb::Use,
        Verb::Open,
        Verb::LookAt,
        Verb::Push,
        Verb::Close,
        Verb::TalkTo,
        Verb::Pull,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Verb::Give => "Give",
            Verb::PickUp => "Pick up",
            Verb::Use => "Use",
            Verb::Open => "Open",
            Verb::LookAt => "Look at",
            Verb::Push => "Push",
            Verb::Close => "Close",
            Verb::TalkTo => "Talk to",
            Verb::Pull => "Pull",
        }
    }

    /// Exact, case-sensitive match against [`Verb::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.label() == label)
    }

    /// `(row, column)` of the verb's button.
    pub fn grid_position(self) -> (usize, usize) {
        let index = self.index();
        (index / VERB_GRID_COLUMNS, index % VERB_GRID_COLUMNS)
    }

    const fn index(self) -> usize {
        match self {
            Verb::Give => 0,
            Verb::PickUp => 1,
            Verb::Use => 2,
            Verb::Open => 3,
            Verb::LookAt => 4,
            Verb::Push => 5,
            Verb::Close => 6,
            Verb::TalkTo => 7,
            Verb::Pull => 8,
        }
    }
}
