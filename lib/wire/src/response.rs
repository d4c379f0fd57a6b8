use crate::codec::{Decoder, Encoder};
use pvfs_types::{limits, FsId, Handle, PvfsError, RequestTag, Sid, SidArray};

macro_rules! response_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $(pub $field: $ty),*
        }
    };
}

response_struct!(CreateResponse {
    metafile_handle: Handle,
    metafile_sids: SidArray,
    datafile_handles: Vec<Handle>,
    datafile_sids: Vec<SidArray>,
});

response_struct!(RemoveResponse {});

response_struct!(IoResponse {
    bytes_transferred: u64,
});

response_struct!(GetAttrResponse {
    object_type: u32,
    size: u64,
    owner: u32,
    group: u32,
    perms: u32,
    dfile_count: u32,
});

response_struct!(SetAttrResponse {});

response_struct!(LookupPathResponse {
    handle: Handle,
    object_type: u32,
});

response_struct!(MkDirResponse {
    handle: Handle,
});

#[derive(Clone, Debug, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub handle: Handle,
}

response_struct!(ReadDirResponse {
    entries: Vec<DirEntry>,
    next_token: u64,
});

response_struct!(StatFsResponse {
    fsid: FsId,
    bytes_total: u64,
    bytes_available: u64,
    handles_total: u64,
    handles_available: u64,
    server_count: u32,
});

response_struct!(GetEAttrResponse {
    values: Vec<Vec<u8>>,
});

response_struct!(SetEAttrResponse {});

response_struct!(DelEAttrResponse {});

response_struct!(ListEAttrResponse {
    keys: Vec<String>,
    next_token: u64,
});

response_struct!(BatchCreateResponse {
    handles: Vec<Handle>,
    sids: Vec<SidArray>,
});

response_struct!(BatchRemoveResponse {});

response_struct!(ProtoErrorResponse {
    code: i32,
});

response_struct!(MgmtSetParamResponse {
    previous_mode: u32,
});

response_struct!(MgmtNoopResponse {});

/// The typed response payloads this codec gives full fidelity to, matching
/// `RequestBody`'s coverage subset (§4.1).
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Create(CreateResponse),
    Remove(RemoveResponse),
    Io(IoResponse),
    GetAttr(GetAttrResponse),
    SetAttr(SetAttrResponse),
    LookupPath(LookupPathResponse),
    MkDir(MkDirResponse),
    ReadDir(ReadDirResponse),
    StatFs(StatFsResponse),
    GetEAttr(GetEAttrResponse),
    SetEAttr(SetEAttrResponse),
    DelEAttr(DelEAttrResponse),
    ListEAttr(ListEAttrResponse),
    BatchCreate(BatchCreateResponse),
    BatchRemove(BatchRemoveResponse),
    ProtoError(ProtoErrorResponse),
    MgmtSetParam(MgmtSetParamResponse),
    MgmtNoop(MgmtNoopResponse),
}

impl ResponseBody {
    pub fn tag(&self) -> RequestTag {
        match self {
            ResponseBody::Create(_) => RequestTag::Create,
            ResponseBody::Remove(_) => RequestTag::Remove,
            ResponseBody::Io(_) => RequestTag::Io,
            ResponseBody::GetAttr(_) => RequestTag::GetAttr,
            ResponseBody::SetAttr(_) => RequestTag::SetAttr,
            ResponseBody::LookupPath(_) => RequestTag::LookupPath,
            ResponseBody::MkDir(_) => RequestTag::MkDir,
            ResponseBody::ReadDir(_) => RequestTag::ReadDir,
            ResponseBody::StatFs(_) => RequestTag::StatFs,
            ResponseBody::GetEAttr(_) => RequestTag::GetEAttr,
            ResponseBody::SetEAttr(_) => RequestTag::SetEAttr,
            ResponseBody::DelEAttr(_) => RequestTag::DelEAttr,
            ResponseBody::ListEAttr(_) => RequestTag::ListEAttr,
            ResponseBody::BatchCreate(_) => RequestTag::BatchCreate,
            ResponseBody::BatchRemove(_) => RequestTag::BatchRemove,
            ResponseBody::ProtoError(_) => RequestTag::ProtoError,
            ResponseBody::MgmtSetParam(_) => RequestTag::MgmtSetParam,
            ResponseBody::MgmtNoop(_) => RequestTag::MgmtNoop,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match self {
            ResponseBody::Create(r) => {
                enc.write_handle(r.metafile_handle);
                enc.write_sid_array(&r.metafile_sids);
                enc.write_handle_array(&r.datafile_handles);
                enc.write_u32(r.datafile_sids.len() as u32);
                enc.pad_align8();
                for sids in &r.datafile_sids {
                    enc.write_sid_array(sids);
                }
            }
            ResponseBody::Remove(_) => {}
            ResponseBody::Io(r) => {
                enc.write_u64(r.bytes_transferred);
            }
            ResponseBody::GetAttr(r) => {
                enc.write_u32(r.object_type);
                enc.pad_align8();
                enc.write_u64(r.size);
                enc.write_u32(r.owner);
                enc.write_u32(r.group);
                enc.write_u32(r.perms);
                enc.write_u32(r.dfile_count);
                enc.pad_align8();
            }
            ResponseBody::SetAttr(_) => {}
            ResponseBody::LookupPath(r) => {
                enc.write_handle(r.handle);
                enc.write_u32(r.object_type);
                enc.pad_align8();
            }
            ResponseBody::MkDir(r) => {
                enc.write_handle(r.handle);
            }
            ResponseBody::ReadDir(r) => {
                enc.write_u32(r.entries.len() as u32);
                enc.pad_align8();
                for entry in &r.entries {
                    enc.write_string(&entry.name);
                    enc.write_handle(entry.handle);
                }
                enc.write_u64(r.next_token);
            }
            ResponseBody::StatFs(r) => {
                enc.write_fsid(r.fsid);
                enc.pad_align8();
                enc.write_u64(r.bytes_total);
                enc.write_u64(r.bytes_available);
                enc.write_u64(r.handles_total);
                enc.write_u64(r.handles_available);
                enc.write_u32(r.server_count);
                enc.pad_align8();
            }
            ResponseBody::GetEAttr(r) => {
                enc.write_u32(r.values.len() as u32);
                enc.pad_align8();
                for value in &r.values {
                    enc.write_blob(value);
                }
            }
            ResponseBody::SetEAttr(_) => {}
            ResponseBody::DelEAttr(_) => {}
            ResponseBody::ListEAttr(r) => {
                enc.write_u32(r.keys.len() as u32);
                enc.pad_align8();
                for key in &r.keys {
                    enc.write_string(key);
                }
                enc.write_u64(r.next_token);
            }
            ResponseBody::BatchCreate(r) => {
                enc.write_handle_array(&r.handles);
                enc.write_u32(r.sids.len() as u32);
                enc.pad_align8();
                for sids in &r.sids {
                    enc.write_sid_array(sids);
                }
            }
            ResponseBody::BatchRemove(_) => {}
            ResponseBody::ProtoError(r) => {
                enc.write_i32(r.code);
                enc.pad_align8();
            }
            ResponseBody::MgmtSetParam(r) => {
                enc.write_u32(r.previous_mode);
                enc.pad_align8();
            }
            ResponseBody::MgmtNoop(_) => {}
        }
    }

    pub(crate) fn decode(tag: RequestTag, dec: &mut Decoder) -> Result<ResponseBody, PvfsError> {
        Ok(match tag {
            RequestTag::Create => {
                let metafile_handle = dec.read_handle()?;
                let metafile_sids = dec.read_sid_array(limits::MAX_SIDS)?;
                let datafile_handles = dec.read_handle_array(limits::MAX_HANDLES)?;
                let sid_group_count = dec.read_u32()? as usize;
                if sid_group_count > limits::MAX_HANDLES {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut datafile_sids = Vec::with_capacity(sid_group_count);
                for _ in 0..sid_group_count {
                    datafile_sids.push(dec.read_sid_array(limits::MAX_SIDS)?);
                }
                ResponseBody::Create(CreateResponse { metafile_handle, metafile_sids, datafile_handles, datafile_sids })
            }
            RequestTag::Remove => ResponseBody::Remove(RemoveResponse {}),
            RequestTag::Io | RequestTag::SmallIo => {
                let bytes_transferred = dec.read_u64()?;
                ResponseBody::Io(IoResponse { bytes_transferred })
            }
            RequestTag::GetAttr => {
                let object_type = dec.read_u32()?;
                dec.align8()?;
                let size = dec.read_u64()?;
                let owner = dec.read_u32()?;
                let group = dec.read_u32()?;
                let perms = dec.read_u32()?;
                let dfile_count = dec.read_u32()?;
                dec.align8()?;
                ResponseBody::GetAttr(GetAttrResponse { object_type, size, owner, group, perms, dfile_count })
            }
            RequestTag::SetAttr | RequestTag::TreeSetAttr => ResponseBody::SetAttr(SetAttrResponse {}),
            RequestTag::LookupPath => {
                let handle = dec.read_handle()?;
                let object_type = dec.read_u32()?;
                dec.align8()?;
                ResponseBody::LookupPath(LookupPathResponse { handle, object_type })
            }
            RequestTag::MkDir => {
                let handle = dec.read_handle()?;
                ResponseBody::MkDir(MkDirResponse { handle })
            }
            RequestTag::ReadDir => {
                let entry_count = dec.read_u32()? as usize;
                if entry_count > limits::MAX_DIRENTS {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut entries = Vec::with_capacity(entry_count);
                for _ in 0..entry_count {
                    let name = dec.read_string(limits::MAX_SEGMENT)?;
                    let handle = dec.read_handle()?;
                    entries.push(DirEntry { name, handle });
                }
                let next_token = dec.read_u64()?;
                ResponseBody::ReadDir(ReadDirResponse { entries, next_token })
            }
            RequestTag::StatFs => {
                let fsid = dec.read_fsid()?;
                dec.align8()?;
                let bytes_total = dec.read_u64()?;
                let bytes_available = dec.read_u64()?;
                let handles_total = dec.read_u64()?;
                let handles_available = dec.read_u64()?;
                let server_count = dec.read_u32()?;
                dec.align8()?;
                ResponseBody::StatFs(StatFsResponse { fsid, bytes_total, bytes_available, handles_total, handles_available, server_count })
            }
            RequestTag::GetEAttr => {
                let value_count = dec.read_u32()? as usize;
                if value_count > limits::MAX_KEYVAL_LIST {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut values = Vec::with_capacity(value_count);
                for _ in 0..value_count {
                    values.push(dec.read_blob(limits::MAX_EATTR_VALUE)?);
                }
                ResponseBody::GetEAttr(GetEAttrResponse { values })
            }
            RequestTag::SetEAttr => ResponseBody::SetEAttr(SetEAttrResponse {}),
            RequestTag::DelEAttr => ResponseBody::DelEAttr(DelEAttrResponse {}),
            RequestTag::ListEAttr | RequestTag::ListAttr => {
                let key_count = dec.read_u32()? as usize;
                if key_count > limits::MAX_KEYVAL_LIST {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut keys = Vec::with_capacity(key_count);
                for _ in 0..key_count {
                    keys.push(dec.read_string(limits::MAX_EATTR_KEY)?);
                }
                let next_token = dec.read_u64()?;
                ResponseBody::ListEAttr(ListEAttrResponse { keys, next_token })
            }
            RequestTag::BatchCreate => {
                let handles = dec.read_handle_array(limits::MAX_HANDLES)?;
                let sid_group_count = dec.read_u32()? as usize;
                if sid_group_count > limits::MAX_HANDLES {
                    return Err(PvfsError::Protocol);
                }
                dec.align8()?;
                let mut sids = Vec::with_capacity(sid_group_count);
                for _ in 0..sid_group_count {
                    sids.push(dec.read_sid_array(limits::MAX_SIDS)?);
                }
                ResponseBody::BatchCreate(BatchCreateResponse { handles, sids })
            }
            RequestTag::BatchRemove => ResponseBody::BatchRemove(BatchRemoveResponse {}),
            RequestTag::ProtoError => {
                let code = dec.read_i32()?;
                dec.align8()?;
                ResponseBody::ProtoError(ProtoErrorResponse { code })
            }
            RequestTag::MgmtSetParam => {
                let previous_mode = dec.read_u32()?;
                dec.align8()?;
                ResponseBody::MgmtSetParam(MgmtSetParamResponse { previous_mode })
            }
            RequestTag::MgmtNoop => ResponseBody::MgmtNoop(MgmtNoopResponse {}),
            _ => return Err(PvfsError::Protocol),
        })
    }
}

pub fn canonical_minimal(tag: RequestTag) -> Option<ResponseBody> {
    Some(match tag {
        RequestTag::Create => ResponseBody::Create(CreateResponse {
            metafile_handle: Handle::new(0),
            metafile_sids: SidArray::new(vec![]),
            datafile_handles: vec![],
            datafile_sids: vec![],
        }),
        RequestTag::Remove => ResponseBody::Remove(RemoveResponse {}),
        RequestTag::Io => ResponseBody::Io(IoResponse { bytes_transferred: 0 }),
        RequestTag::GetAttr => ResponseBody::GetAttr(GetAttrResponse { object_type: 0, size: 0, owner: 0, group: 0, perms: 0, dfile_count: 0 }),
        RequestTag::SetAttr => ResponseBody::SetAttr(SetAttrResponse {}),
        RequestTag::LookupPath => ResponseBody::LookupPath(LookupPathResponse { handle: Handle::new(0), object_type: 0 }),
        RequestTag::MkDir => ResponseBody::MkDir(MkDirResponse { handle: Handle::new(0) }),
        RequestTag::ReadDir => ResponseBody::ReadDir(ReadDirResponse { entries: vec![], next_token: 0 }),
        RequestTag::StatFs => ResponseBody::StatFs(StatFsResponse { fsid: FsId(0), bytes_total: 0, bytes_available: 0, handles_total: 0, handles_available: 0, server_count: 0 }),
        RequestTag::GetEAttr => ResponseBody::GetEAttr(GetEAttrResponse { values: vec![] }),
        RequestTag::SetEAttr => ResponseBody::SetEAttr(SetEAttrResponse {}),
        RequestTag::DelEAttr => ResponseBody::DelEAttr(DelEAttrResponse {}),
        RequestTag::ListEAttr => ResponseBody::ListEAttr(ListEAttrResponse { keys: vec![], next_token: 0 }),
        RequestTag::BatchCreate => ResponseBody::BatchCreate(BatchCreateResponse { handles: vec![], sids: vec![] }),
        RequestTag::BatchRemove => ResponseBody::BatchRemove(BatchRemoveResponse {}),
        RequestTag::ProtoError => ResponseBody::ProtoError(ProtoErrorResponse { code: 0 }),
        RequestTag::MgmtSetParam => ResponseBody::MgmtSetParam(MgmtSetParamResponse { previous_mode: 0 }),
        RequestTag::MgmtNoop => ResponseBody::MgmtNoop(MgmtNoopResponse {}),
        _ => return None,
    })
}

pub fn canonical_maximal(tag: RequestTag) -> Option<ResponseBody> {
    Some(match tag {
        RequestTag::Create => ResponseBody::Create(CreateResponse {
            metafile_handle: Handle::new(0),
            metafile_sids: SidArray::new(vec![Sid(0); limits::MAX_SIDS]),
            datafile_handles: vec![Handle::new(0); limits::MAX_HANDLES],
            datafile_sids: (0..limits::MAX_HANDLES).map(|_| SidArray::new(vec![Sid(0); 3])).collect(),
        }),
        RequestTag::ReadDir => ResponseBody::ReadDir(ReadDirResponse {
            entries: (0..limits::MAX_DIRENTS)
                .map(|_| DirEntry { name: "n".repeat(limits::MAX_SEGMENT), handle: Handle::new(0) })
                .collect(),
            next_token: 0,
        }),
        RequestTag::GetEAttr => ResponseBody::GetEAttr(GetEAttrResponse {
            values: (0..limits::MAX_KEYVAL_LIST).map(|_| vec![0u8; limits::MAX_EATTR_VALUE]).collect(),
        }),
        RequestTag::ListEAttr => ResponseBody::ListEAttr(ListEAttrResponse {
            keys: (0..limits::MAX_KEYVAL_LIST).map(|_| "k".repeat(limits::MAX_EATTR_KEY)).collect(),
            next_token: 0,
        }),
        RequestTag::BatchCreate => ResponseBody::BatchCreate(BatchCreateResponse {
            handles: vec![Handle::new(0); limits::MAX_HANDLES],
            sids: (0..limits::MAX_HANDLES).map(|_| SidArray::new(vec![Sid(0); 3])).collect(),
        }),
        _ => return canonical_minimal(tag),
    })
}
