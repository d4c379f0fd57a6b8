use crate::codec::{Decoder, Encoder};
use pvfs_types::{limits, Capability, FsId, Handle, PvfsError, RequestTag};

/// A mode the `MGMT_SETPARAM` request can select (§4.4's mode gate).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ServerMode {
    Normal,
    Admin,
}

impl ServerMode {
    fn to_wire(self) -> u32 {
        match self {
            ServerMode::Normal => 0,
            ServerMode::Admin => 1,
        }
    }

    fn from_wire(v: u32) -> Result<ServerMode, PvfsError> {
        match v {
            0 => Ok(ServerMode::Normal),
            1 => Ok(ServerMode::Admin),
            _ => Err(PvfsError::Protocol),
        }
    }
}

macro_rules! request_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $(pub $field: $ty),*
        }
    };
}

request_struct!(CreateRequest {
    fsid: FsId,
    object_type: u32,
    num_dfiles_req: i32,
    capability: Capability,
});

request_struct!(RemoveRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
});

request_struct!(IoRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    is_write: bool,
    offset: u64,
    size: u64,
});

request_struct!(GetAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    attr_mask: u32,
});

request_struct!(SetAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    attr_mask: u32,
    size: u64,
    owner: u32,
    group: u32,
    perms: u32,
});

request_struct!(LookupPathRequest {
    fsid: FsId,
    parent_handle: Handle,
    capability: Capability,
    path: String,
});

request_struct!(MkDirRequest {
    fsid: FsId,
    parent_handle: Handle,
    capability: Capability,
    segment: String,
    object_type: u32,
});

request_struct!(ReadDirRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    token: u64,
    dirent_limit: u32,
});

request_struct!(StatFsRequest {
    fsid: FsId,
    capability: Capability,
});

request_struct!(GetEAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    keys: Vec<String>,
});

request_struct!(SetEAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    keys: Vec<String>,
    values: Vec<Vec<u8>>,
});

request_struct!(DelEAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    key: String,
});

request_struct!(ListEAttrRequest {
    fsid: FsId,
    handle: Handle,
    capability: Capability,
    token: u64,
    count_limit: u32,
});

request_struct!(BatchCreateRequest {
    fsid: FsId,
    capability: Capability,
    object_count: u32,
    object_type: u32,
});

request_struct!(BatchRemoveRequest {
    fsid: FsId,
    capability: Capability,
    handles: Vec<Handle>,
});

request_struct!(MgmtSetParamRequest {
    capability: Capability,
    mode: ServerMode,
});

request_struct!(MgmtNoopRequest {});

/// The typed request payloads this codec gives full fidelity to (§1's Non-goal on the
/// exact filesystem op set means this need not cover every tag in `RequestTag` — see
/// SPEC_FULL.md §4.1).
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Create(CreateRequest),
    Remove(RemoveRequest),
    Io(IoRequest),
    GetAttr(GetAttrRequest),
    SetAttr(SetAttrRequest),
    LookupPath(LookupPathRequest),
    MkDir(MkDirRequest),
    ReadDir(ReadDirRequest),
    StatFs(StatFsRequest),
    GetEAttr(GetEAttrRequest),
    SetEAttr(SetEAttrRequest),
    DelEAttr(DelEAttrRequest),
    ListEAttr(ListEAttrRequest),
    BatchCreate(BatchCreateRequest),
    BatchRemove(BatchRemoveRequest),
    MgmtSetParam(MgmtSetParamRequest),
    MgmtNoop(MgmtNoopRequest),
}

impl RequestBody {
    pub fn tag(&self) -> RequestTag {
        match self {
            RequestBody::Create(_) => RequestTag::Create,
            RequestBody::Remove(_) => RequestTag::Remove,
            RequestBody::Io(_) => RequestTag::Io,
            RequestBody::GetAttr(_) => RequestTag::GetAttr,
            RequestBody::SetAttr(_) => RequestTag::SetAttr,
            RequestBody::LookupPath(_) => RequestTag::LookupPath,
            RequestBody::MkDir(_) => RequestTag::MkDir,
            RequestBody::ReadDir(_) => RequestTag::ReadDir,
            RequestBody::StatFs(_) => RequestTag::StatFs,
            RequestBody::GetEAttr(_) => RequestTag::GetEAttr,
            RequestBody::SetEAttr(_) => RequestTag::SetEAttr,
            RequestBody::DelEAttr(_) => RequestTag::DelEAttr,
            RequestBody::ListEAttr(_) => RequestTag::ListEAttr,
            RequestBody::BatchCreate(_) => RequestTag::BatchCreate,
            RequestBody::BatchRemove(_) => RequestTag::BatchRemove,
            RequestBody::MgmtSetParam(_) => RequestTag::MgmtSetParam,
            RequestBody::MgmtNoop(_) => RequestTag::MgmtNoop,
        }
    }

    /// The handle this request targets, for the scheduler's per-handle classification
    /// (§4.4). Requests with no natural target handle (batch create, statfs, noop, the
    /// mode-gate request) target the zero handle, which the scheduler treats specially.
    pub fn target_handle(&self) -> Handle {
        match self {
            RequestBody::Create(_) => Handle::new(0),
            RequestBody::Remove(r) => r.handle,
            RequestBody::Io(r) => r.handle,
            RequestBody::GetAttr(r) => r.handle,
            RequestBody::SetAttr(r) => r.handle,
            RequestBody::LookupPath(r) => r.parent_handle,
            RequestBody::MkDir(r) => r.parent_handle,
            RequestBody::ReadDir(r) => r.handle,
            RequestBody::StatFs(_) => Handle::new(0),
            RequestBody::GetEAttr(r) => r.handle,
            RequestBody::SetEAttr(r) => r.handle,
            RequestBody::DelEAttr(r) => r.handle,
            RequestBody::ListEAttr(r) => r.handle,
            RequestBody::BatchCreate(_) => Handle::new(0),
            RequestBody::BatchRemove(_) => Handle::new(0),
            RequestBody::MgmtSetParam(_) => Handle::new(0),
            RequestBody::MgmtNoop(_) => Handle::new(0),
        }
    }

    pub fn fsid(&self) -> FsId {
        match self {
            RequestBody::Create(r) => r.fsid,
            RequestBody::Remove(r) => r.fsid,
            RequestBody::Io(r) => r.fsid,
            RequestBody::GetAttr(r) => r.fsid,
            RequestBody::SetAttr(r) => r.fsid,
            RequestBody::LookupPath(r) => r.fsid,
            RequestBody::MkDir(r) => r.fsid,
            RequestBody::ReadDir(r) => r.fsid,
            RequestBody::StatFs(r) => r.fsid,
            RequestBody::GetEAttr(r) => r.fsid,
            RequestBody::SetEAttr(r) => r.fsid,
            RequestBody::DelEAttr(r) => r.fsid,
            RequestBody::ListEAttr(r) => r.fsid,
            RequestBody::BatchCreate(r) => r.fsid,
            RequestBody::BatchRemove(r) => r.fsid,
            RequestBody::MgmtSetParam(_) => FsId(0),
            RequestBody::MgmtNoop(_) => FsId(0),
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match self {
            RequestBody::Create(r) => {
                enc.write_fsid(r.fsid);
                enc.write_u32(r.object_type);
                enc.write_i32(r.num_dfiles_req);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::Remove(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_capability(&r.capability);
            }
            RequestBody::Io(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u8(r.is_write as u8);
                enc.pad_align8();
                enc.write_u64(r.offset);
                enc.write_u64(r.size);
                enc.write_capability(&r.capability);
            }
            RequestBody::GetAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u32(r.attr_mask);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::SetAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u32(r.attr_mask);
                enc.pad_align8();
                enc.write_u64(r.size);
                enc.write_u32(r.owner);
                enc.write_u32(r.group);
                enc.write_u32(r.perms);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::LookupPath(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.parent_handle);
                enc.write_string(&r.path);
                enc.write_capability(&r.capability);
            }
            RequestBody::MkDir(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.parent_handle);
                enc.write_string(&r.segment);
                enc.write_u32(r.object_type);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::ReadDir(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u64(r.token);
                enc.write_u32(r.dirent_limit);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::StatFs(r) => {
                enc.write_fsid(r.fsid);
                enc.write_capability(&r.capability);
            }
            RequestBody::GetEAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u32(r.keys.len() as u32);
                enc.pad_align8();
                for key in &r.keys {
                    enc.write_string(key);
                }
                enc.write_capability(&r.capability);
            }
            RequestBody::SetEAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u32(r.keys.len() as u32);
                enc.pad_align8();
                for key in &r.keys {
                    enc.write_string(key);
                }
                for value in &r.values {
                    enc.write_blob(value);
                }
                enc.write_capability(&r.capability);
            }
            RequestBody::DelEAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_string(&r.key);
                enc.write_capability(&r.capability);
            }
            RequestBody::ListEAttr(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle(r.handle);
                enc.write_u64(r.token);
                enc.write_u32(r.count_limit);
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::BatchCreate(r) => {
                enc.write_fsid(r.fsid);
                enc.write_u32(r.object_count);
                enc.write_u32(r.object_type);
                enc.write_capability(&r.capability);
            }
            RequestBody::BatchRemove(r) => {
                enc.write_fsid(r.fsid);
                enc.write_handle_array(&r.handles);
                enc.write_capability(&r.capability);
            }
            RequestBody::MgmtSetParam(r) => {
                enc.write_u32(r.mode.to_wire());
                enc.pad_align8();
                enc.write_capability(&r.capability);
            }
            RequestBody::MgmtNoop(_) => {}
        }
    }

    pub(crate) fn decode(tag: RequestTag, dec: &mut Decoder) -> Result<RequestBody, PvfsError> {
        Ok(match tag {
            RequestTag::Create => {
                let fsid = dec.read_fsid()?;
                let object_type = dec.read_u32()?;
                let num_dfiles_req = dec.read_i32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::Create(CreateRequest { fsid, object_type, num_dfiles_req, capability })
            }
            RequestTag::Remove => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let capability = dec.read_capability()?;
                RequestBody::Remove(RemoveRequest { fsid, handle, capability })
            }
            RequestTag::Io | RequestTag::SmallIo => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let is_write = dec.read_u8()? != 0;
                dec.align8()?;
                let offset = dec.read_u64()?;
                let size = dec.read_u64()?;
                let capability = dec.read_capability()?;
                RequestBody::Io(IoRequest { fsid, handle, capability, is_write, offset, size })
            }
            RequestTag::GetAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let attr_mask = dec.read_u32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::GetAttr(GetAttrRequest { fsid, handle, capability, attr_mask })
            }
            RequestTag::SetAttr | RequestTag::TreeSetAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let attr_mask = dec.read_u32()?;
                dec.align8()?;
                let size = dec.read_u64()?;
                let owner = dec.read_u32()?;
                let group = dec.read_u32()?;
                let perms = dec.read_u32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::SetAttr(SetAttrRequest { fsid, handle, capability, attr_mask, size, owner, group, perms })
            }
            RequestTag::LookupPath => {
                let fsid = dec.read_fsid()?;
                let parent_handle = dec.read_handle()?;
                let path = dec.read_string(limits::MAX_PATH)?;
                let capability = dec.read_capability()?;
                RequestBody::LookupPath(LookupPathRequest { fsid, parent_handle, capability, path })
            }
            RequestTag::MkDir => {
                let fsid = dec.read_fsid()?;
                let parent_handle = dec.read_handle()?;
                let segment = dec.read_string(limits::MAX_SEGMENT)?;
                let object_type = dec.read_u32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::MkDir(MkDirRequest { fsid, parent_handle, capability, segment, object_type })
            }
            RequestTag::ReadDir => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let token = dec.read_u64()?;
                let dirent_limit = dec.read_u32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::ReadDir(ReadDirRequest { fsid, handle, capability, token, dirent_limit })
            }
            RequestTag::StatFs => {
                let fsid = dec.read_fsid()?;
                let capability = dec.read_capability()?;
                RequestBody::StatFs(StatFsRequest { fsid, capability })
            }
            RequestTag::GetEAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let key_count = dec.read_u32()? as usize;
                if key_count > limits::MAX_KEYVAL_LIST {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut keys = Vec::with_capacity(key_count);
                for _ in 0..key_count {
                    keys.push(dec.read_string(limits::MAX_EATTR_KEY)?);
                }
                let capability = dec.read_capability()?;
                RequestBody::GetEAttr(GetEAttrRequest { fsid, handle, capability, keys })
            }
            RequestTag::SetEAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let key_count = dec.read_u32()? as usize;
                if key_count > limits::MAX_KEYVAL_LIST {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut keys = Vec::with_capacity(key_count);
                for _ in 0..key_count {
                    keys.push(dec.read_string(limits::MAX_EATTR_KEY)?);
                }
                let mut values = Vec::with_capacity(key_count);
                for _ in 0..key_count {
                    values.push(dec.read_blob(limits::MAX_EATTR_VALUE)?);
                }
                let capability = dec.read_capability()?;
                RequestBody::SetEAttr(SetEAttrRequest { fsid, handle, capability, keys, values })
            }
            RequestTag::DelEAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let key = dec.read_string(limits::MAX_EATTR_KEY)?;
                let capability = dec.read_capability()?;
                RequestBody::DelEAttr(DelEAttrRequest { fsid, handle, capability, key })
            }
            RequestTag::ListEAttr | RequestTag::ListAttr => {
                let fsid = dec.read_fsid()?;
                let handle = dec.read_handle()?;
                let token = dec.read_u64()?;
                let count_limit = dec.read_u32()?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::ListEAttr(ListEAttrRequest { fsid, handle, capability, token, count_limit })
            }
            RequestTag::BatchCreate => {
                let fsid = dec.read_fsid()?;
                let object_count = dec.read_u32()?;
                let object_type = dec.read_u32()?;
                let capability = dec.read_capability()?;
                RequestBody::BatchCreate(BatchCreateRequest { fsid, capability, object_count, object_type })
            }
            RequestTag::BatchRemove => {
                let fsid = dec.read_fsid()?;
                let handles = dec.read_handle_array(limits::MAX_HANDLES)?;
                let capability = dec.read_capability()?;
                RequestBody::BatchRemove(BatchRemoveRequest { fsid, capability, handles })
            }
            RequestTag::MgmtSetParam => {
                let mode = ServerMode::from_wire(dec.read_u32()?)?;
                dec.align8()?;
                let capability = dec.read_capability()?;
                RequestBody::MgmtSetParam(MgmtSetParamRequest { capability, mode })
            }
            RequestTag::MgmtNoop => RequestBody::MgmtNoop(MgmtNoopRequest {}),
            // Every other tag in the closed set — reserved duplicates, response-only
            // tags like `ProtoError`, and ops this codec gives no typed payload to
            // (§1 Non-goal: the exact filesystem op set is out of scope) — is rejected.
            _ => return Err(PvfsError::Protocol),
        })
    }
}

/// Canonical instances used to precompute `max_encoded_size` and to self-verify the
/// budget at startup (§4.1). `minimal` is the smallest legal instance of the variant;
/// `maximal` saturates every size-limited field, so its encoded length is the true
/// upper bound the codec preallocates sends against.
pub fn canonical_minimal(tag: RequestTag) -> Option<RequestBody> {
    let cap = Capability::new(0, vec![], 0, 0, vec![]);
    Some(match tag {
        RequestTag::Create => RequestBody::Create(CreateRequest { fsid: FsId(0), object_type: 0, num_dfiles_req: 0, capability: cap }),
        RequestTag::Remove => RequestBody::Remove(RemoveRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap }),
        RequestTag::Io => RequestBody::Io(IoRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, is_write: false, offset: 0, size: 0 }),
        RequestTag::GetAttr => RequestBody::GetAttr(GetAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, attr_mask: 0 }),
        RequestTag::SetAttr => RequestBody::SetAttr(SetAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, attr_mask: 0, size: 0, owner: 0, group: 0, perms: 0 }),
        RequestTag::LookupPath => RequestBody::LookupPath(LookupPathRequest { fsid: FsId(0), parent_handle: Handle::new(0), capability: cap, path: String::new() }),
        RequestTag::MkDir => RequestBody::MkDir(MkDirRequest { fsid: FsId(0), parent_handle: Handle::new(0), capability: cap, segment: String::new(), object_type: 0 }),
        RequestTag::ReadDir => RequestBody::ReadDir(ReadDirRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, token: 0, dirent_limit: 0 }),
        RequestTag::StatFs => RequestBody::StatFs(StatFsRequest { fsid: FsId(0), capability: cap }),
        RequestTag::GetEAttr => RequestBody::GetEAttr(GetEAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, keys: vec![] }),
        RequestTag::SetEAttr => RequestBody::SetEAttr(SetEAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, keys: vec![], values: vec![] }),
        RequestTag::DelEAttr => RequestBody::DelEAttr(DelEAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, key: String::new() }),
        RequestTag::ListEAttr => RequestBody::ListEAttr(ListEAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, token: 0, count_limit: 0 }),
        RequestTag::BatchCreate => RequestBody::BatchCreate(BatchCreateRequest { fsid: FsId(0), capability: cap, object_count: 0, object_type: 0 }),
        RequestTag::BatchRemove => RequestBody::BatchRemove(BatchRemoveRequest { fsid: FsId(0), capability: cap, handles: vec![] }),
        RequestTag::MgmtSetParam => RequestBody::MgmtSetParam(MgmtSetParamRequest { capability: cap, mode: ServerMode::Normal }),
        RequestTag::MgmtNoop => RequestBody::MgmtNoop(MgmtNoopRequest {}),
        _ => return None,
    })
}

pub fn canonical_maximal(tag: RequestTag) -> Option<RequestBody> {
    let cap = Capability::new(
        0,
        vec![0u8; limits::MAX_SIGNATURE],
        0,
        u32::MAX,
        vec![Handle::new(0); limits::MAX_HANDLES],
    );
    let long_path = "p".repeat(limits::MAX_PATH);
    let long_segment = "s".repeat(limits::MAX_SEGMENT);
    let long_key = "k".repeat(limits::MAX_EATTR_KEY);
    Some(match tag {
        RequestTag::LookupPath => RequestBody::LookupPath(LookupPathRequest { fsid: FsId(0), parent_handle: Handle::new(0), capability: cap, path: long_path }),
        RequestTag::MkDir => RequestBody::MkDir(MkDirRequest { fsid: FsId(0), parent_handle: Handle::new(0), capability: cap, segment: long_segment, object_type: 0 }),
        RequestTag::GetEAttr => RequestBody::GetEAttr(GetEAttrRequest {
            fsid: FsId(0),
            handle: Handle::new(0),
            capability: cap,
            keys: vec![long_key; limits::MAX_KEYVAL_LIST],
        }),
        RequestTag::SetEAttr => RequestBody::SetEAttr(SetEAttrRequest {
            fsid: FsId(0),
            handle: Handle::new(0),
            capability: cap,
            keys: (0..limits::MAX_KEYVAL_LIST).map(|_| long_key.clone()).collect(),
            values: (0..limits::MAX_KEYVAL_LIST).map(|_| vec![0u8; limits::MAX_EATTR_VALUE]).collect(),
        }),
        RequestTag::DelEAttr => RequestBody::DelEAttr(DelEAttrRequest { fsid: FsId(0), handle: Handle::new(0), capability: cap, key: long_key }),
        RequestTag::BatchRemove => RequestBody::BatchRemove(BatchRemoveRequest { fsid: FsId(0), capability: cap, handles: vec![Handle::new(0); limits::MAX_HANDLES] }),
        _ => return canonical_minimal(tag).map(|body| patch_capability(body, cap)),
    })
}

fn patch_capability(mut body: RequestBody, cap: Capability) -> RequestBody {
    match &mut body {
        RequestBody::Create(r) => r.capability = cap,
        RequestBody::Remove(r) => r.capability = cap,
        RequestBody::Io(r) => r.capability = cap,
        RequestBody::GetAttr(r) => r.capability = cap,
        RequestBody::SetAttr(r) => r.capability = cap,
        RequestBody::LookupPath(r) => r.capability = cap,
        RequestBody::MkDir(r) => r.capability = cap,
        RequestBody::ReadDir(r) => r.capability = cap,
        RequestBody::StatFs(r) => r.capability = cap,
        RequestBody::GetEAttr(r) => r.capability = cap,
        RequestBody::SetEAttr(r) => r.capability = cap,
        RequestBody::DelEAttr(r) => r.capability = cap,
        RequestBody::ListEAttr(r) => r.capability = cap,
        RequestBody::BatchCreate(r) => r.capability = cap,
        RequestBody::BatchRemove(r) => r.capability = cap,
        RequestBody::MgmtSetParam(r) => r.capability = cap,
        RequestBody::MgmtNoop(_) => {}
    }
    body
}
