use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag(u32);

impl Tag {
    pub fn inc(&self) -> Self {
        Tag(self.0 + 1)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Hands out local variable names for generated loops.
///
/// One instance lives for a whole program, so every name it returns is
/// distinct from all earlier ones no matter how deeply loops nest.
#[derive(Debug, Default)]
pub struct Temporaries {
    next: Tag,
}

impl Temporaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let tag = self.next;
        self.next = tag.inc();
        format!("{prefix}{tag}")
    }
}
