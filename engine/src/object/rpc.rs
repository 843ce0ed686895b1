//! Engine-reserved rpc methods and payload layout.
//!
//! An Rpc payload is `method: u8` followed by the method's argument bytes.
//! A BinaryData payload is `sub_router: u8` followed by the data.

use crate::{
    codec::{ByteReader, ByteWriter, Serde, SerdeErr},
    object::RpcCall,
    types::{PlayerId, Timestep},
};

/// Tears the object down on every peer
pub const DESTROY_RPC: u8 = 0;
/// Server tells everyone which player now owns the object, args: `owner: u32`
pub const ASSIGN_OWNERSHIP_RPC: u8 = 1;
/// First method id available to applications
pub const FIRST_APPLICATION_RPC: u8 = 4;

/// BinaryData sub-router carrying dirty-field replication
pub const DIRTY_FIELDS_SUB_ROUTER: u8 = 1;

pub fn is_reserved(method: u8) -> bool {
    method < FIRST_APPLICATION_RPC
}

pub fn encode_call(method: u8, args: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    method.ser(&mut writer);
    writer.write_bytes(args);
    writer.to_bytes()
}

pub fn decode_call(payload: &[u8], sender: PlayerId, timestep: Timestep) -> Result<RpcCall, SerdeErr> {
    let mut reader = ByteReader::new(payload);
    let method = u8::de(&mut reader)?;
    Ok(RpcCall {
        method,
        args: reader.read_to_end().to_vec(),
        sender,
        timestep,
    })
}

pub fn encode_binary_data(sub_router: u8, data: &[u8]) -> Vec<u8> {
    encode_call(sub_router, data)
}

pub fn decode_binary_data(payload: &[u8]) -> Result<(u8, &[u8]), SerdeErr> {
    let mut reader = ByteReader::new(payload);
    let sub_router = u8::de(&mut reader)?;
    Ok((sub_router, reader.read_to_end()))
}
