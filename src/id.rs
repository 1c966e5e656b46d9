use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ProjectId {
    value: u64,
}

/// Project-scoped merge request number (`iid`), not the global id.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct MergeRequestIid {
    value: u64,
}

impl ProjectId {
    pub fn new(id: u64) -> Self { Self { value: id } }

    pub fn value(&self) -> u64 { self.value }

    /// Parses a repository uid; only positive integers are project ids.
    pub fn parse(uid: &str) -> Option<Self> {
        uid.trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .map(Self::new)
    }
}

impl MergeRequestIid {
    pub fn new(iid: u64) -> Self { Self { value: iid } }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<ProjectId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(ProjectId::new(id))
    }
}

impl<'de> Deserialize<'de> for MergeRequestIid {
    fn deserialize<D>(deserializer: D) -> Result<MergeRequestIid, D::Error>
        where D: Deserializer<'de>,
    {
        let iid = u64::deserialize(deserializer)?;
        Ok(MergeRequestIid::new(iid))
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for MergeRequestIid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
