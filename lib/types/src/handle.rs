use std::fmt;

/// Opaque fixed-width identifier of a filesystem object. Handles have no intrinsic
/// ordering beyond equality (§3); `Ord`/`Hash` are derived only so handles can key a
/// `HashMap` (the scheduler's per-handle list table) and sort deterministically in
/// tests, not because the wire protocol assigns them meaning.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Handle(pub u64);

impl Handle {
    #[inline]
    pub const fn new(id: u64) -> Handle {
        Handle(id)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

impl From<u64> for Handle {
    #[inline]
    fn from(id: u64) -> Handle {
        Handle(id)
    }
}

/// A filesystem id, distinguishing which filesystem instance a handle belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct FsId(pub u32);

impl From<u32> for FsId {
    #[inline]
    fn from(id: u32) -> FsId {
        FsId(id)
    }
}

/// Pairs a handle with the filesystem id it belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Reference {
    pub handle: Handle,
    pub fsid: FsId,
}

impl Reference {
    #[inline]
    pub const fn new(handle: Handle, fsid: FsId) -> Reference {
        Reference { handle, fsid }
    }
}

/// A closed handle range `[first, last]`, both inclusive.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Extent {
    pub first: Handle,
    pub last: Handle,
}

impl Extent {
    #[inline]
    pub const fn new(first: Handle, last: Handle) -> Extent {
        Extent { first, last }
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.first.0 <= handle.0 && handle.0 <= self.last.0
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.last.0 - self.first.0 + 1
    }
}

/// Enumerates the ranges a server is authoritative for.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ExtentArray {
    pub extents: Vec<Extent>,
}

impl ExtentArray {
    #[inline]
    pub fn new(extents: Vec<Extent>) -> ExtentArray {
        ExtentArray { extents }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.extents.iter().any(|extent| extent.contains(handle))
    }
}

/// Opaque server/replica identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Sid(pub u32);

impl From<u32> for Sid {
    #[inline]
    fn from(id: u32) -> Sid {
        Sid(id)
    }
}

/// An ordered list of replica/server identifiers, whose length equals a replication
/// factor (§3).
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct SidArray {
    pub sids: Vec<Sid>,
}

impl SidArray {
    #[inline]
    pub fn new(sids: Vec<Sid>) -> SidArray {
        SidArray { sids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sids.is_empty()
    }
}
