use crate::handle::{FsId, Handle};

/// The closed request-tag set (§6). Values are the authoritative on-the-wire codes;
/// the decoder must reject anything not in this list. `Reserved` carries the four
/// non-protocol/duplicate values §6's Open Question calls out
/// (`PERF_UPDATE=19`, `JOB_TIMER=27`, `PRECREATE_POOL_REFILLER=37`,
/// `GET_CONFIG=48`): recognised internally (see DESIGN.md) but always rejected on the
/// wire.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u32)]
pub enum RequestTag {
    Invalid = 0,
    Create = 1,
    Remove = 2,
    Io = 3,
    GetAttr = 4,
    SetAttr = 5,
    LookupPath = 6,
    CrDirEnt = 7,
    RmDirEnt = 8,
    ChDirEnt = 9,
    Truncate = 10,
    MkDir = 11,
    ReadDir = 12,
    GetConfig = 13,
    WriteCompletion = 14,
    Flush = 15,
    MgmtSetParam = 16,
    MgmtNoop = 17,
    StatFs = 18,
    PerfUpdate = 19,
    MgmtPerfMon = 20,
    MgmtIterateHandles = 21,
    MgmtDspaceInfoList = 22,
    MgmtEventMon = 23,
    MgmtRemoveObject = 24,
    MgmtRemoveDirent = 25,
    MgmtGetDirdataHandle = 26,
    JobTimer = 27,
    ProtoError = 28,
    GetEAttr = 29,
    SetEAttr = 30,
    DelEAttr = 31,
    ListEAttr = 32,
    SmallIo = 33,
    ListAttr = 34,
    BatchCreate = 35,
    BatchRemove = 36,
    PrecreatePoolRefiller = 37,
    Unstuff = 38,
    Mirror = 39,
    ImmCopies = 40,
    TreeRemove = 41,
    TreeGetFileSize = 42,
    MgmtGetUid = 43,
    TreeSetAttr = 44,
    MgmtGetDirent = 45,
    MgmtSplitDirent = 46,
    AtomicEAttr = 47,
    GetConfigV2 = 48,
    TreeGetAttr = 49,
    MgmtGetUserCert = 50,
    MgmtGetUserCertKeyreq = 51,
}

impl RequestTag {
    /// The four tags §6's Open Question marks reserved/duplicate: present in
    /// the enumeration, but never legal on the wire.
    pub const RESERVED: [RequestTag; 4] = [
        RequestTag::PerfUpdate,
        RequestTag::JobTimer,
        RequestTag::PrecreatePoolRefiller,
        RequestTag::GetConfigV2,
    ];

    pub fn is_reserved(self) -> bool {
        Self::RESERVED.contains(&self)
    }

    /// Round-trips a raw wire code to a tag, or `None` if it is outside the closed set.
    pub fn from_wire(code: u32) -> Option<RequestTag> {
        use RequestTag::*;
        let tag = match code {
            0 => Invalid,
            1 => Create,
            2 => Remove,
            3 => Io,
            4 => GetAttr,
            5 => SetAttr,
            6 => LookupPath,
            7 => CrDirEnt,
            8 => RmDirEnt,
            9 => ChDirEnt,
            10 => Truncate,
            11 => MkDir,
            12 => ReadDir,
            13 => GetConfig,
            14 => WriteCompletion,
            15 => Flush,
            16 => MgmtSetParam,
            17 => MgmtNoop,
            18 => StatFs,
            19 => PerfUpdate,
            20 => MgmtPerfMon,
            21 => MgmtIterateHandles,
            22 => MgmtDspaceInfoList,
            23 => MgmtEventMon,
            24 => MgmtRemoveObject,
            25 => MgmtRemoveDirent,
            26 => MgmtGetDirdataHandle,
            27 => JobTimer,
            28 => ProtoError,
            29 => GetEAttr,
            30 => SetEAttr,
            31 => DelEAttr,
            32 => ListEAttr,
            33 => SmallIo,
            34 => ListAttr,
            35 => BatchCreate,
            36 => BatchRemove,
            37 => PrecreatePoolRefiller,
            38 => Unstuff,
            39 => Mirror,
            40 => ImmCopies,
            41 => TreeRemove,
            42 => TreeGetFileSize,
            43 => MgmtGetUid,
            44 => TreeSetAttr,
            45 => MgmtGetDirent,
            46 => MgmtSplitDirent,
            47 => AtomicEAttr,
            48 => GetConfigV2,
            49 => TreeGetAttr,
            50 => MgmtGetUserCert,
            51 => MgmtGetUserCertKeyreq,
            _ => return None,
        };
        Some(tag)
    }

    #[inline]
    pub fn to_wire(self) -> u32 {
        self as u32
    }

    /// True for ops the concurrent I/O relaxation (§4.4) applies to: reads/writes that
    /// may be scheduled in parallel when contiguous at the head of a handle's list.
    pub fn is_io_style(self) -> bool {
        matches!(self, RequestTag::Io | RequestTag::SmallIo | RequestTag::ReadDir)
    }

    /// True for write/modify ops; used by the mode gate (§4.4) to decide whether an
    /// `admin-permitted` flag is required while a transition to admin mode is pending.
    pub fn is_write_style(self) -> bool {
        matches!(
            self,
            RequestTag::Create
                | RequestTag::Remove
                | RequestTag::Io
                | RequestTag::SmallIo
                | RequestTag::SetAttr
                | RequestTag::CrDirEnt
                | RequestTag::RmDirEnt
                | RequestTag::ChDirEnt
                | RequestTag::Truncate
                | RequestTag::MkDir
                | RequestTag::SetEAttr
                | RequestTag::DelEAttr
                | RequestTag::BatchCreate
                | RequestTag::BatchRemove
                | RequestTag::TreeRemove
                | RequestTag::TreeSetAttr
                | RequestTag::MgmtRemoveObject
                | RequestTag::MgmtRemoveDirent
        )
    }
}

/// The well-known classification every operation tag maps to: its target handle, the
/// filesystem id, and whether it is read-only (§4.4's "a well-known classification maps
/// every operation tag to a target handle, a filesystem id, and a read-only flag").
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OpClass {
    pub tag: RequestTag,
    pub handle: Handle,
    pub fsid: FsId,
    pub read_only: bool,
    pub io_style: bool,
    pub admin_permitted: bool,
}

impl OpClass {
    pub fn new(tag: RequestTag, handle: Handle, fsid: FsId, admin_permitted: bool) -> OpClass {
        OpClass {
            tag,
            handle,
            fsid,
            read_only: !tag.is_write_style(),
            io_style: tag.is_io_style(),
            admin_permitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip_for_every_defined_tag() {
        for code in 0u32..=51u32 {
            let tag = RequestTag::from_wire(code).expect("tag must be defined");
            assert_eq!(tag.to_wire(), code);
        }
        assert!(RequestTag::from_wire(52).is_none());
    }

    #[test]
    fn reserved_tags_are_flagged() {
        assert!(RequestTag::JobTimer.is_reserved());
        assert!(!RequestTag::Create.is_reserved());
    }
}
