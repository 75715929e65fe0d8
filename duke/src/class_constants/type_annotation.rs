//! `target_type` byte values of a `type_annotation` structure, JVMS 4.7.20.1.

pub const CLASS_TYPE_PARAMETER: u8 = 0x00;
pub const METHOD_TYPE_PARAMETER: u8 = 0x01;
pub const CLASS_EXTENDS: u8 = 0x10;
pub const CLASS_TYPE_PARAMETER_BOUND: u8 = 0x11;
pub const METHOD_TYPE_PARAMETER_BOUND: u8 = 0x12;
pub const FIELD: u8 = 0x13;
pub const METHOD_RETURN: u8 = 0x14;
pub const METHOD_RECEIVER: u8 = 0x15;
pub const METHOD_FORMAL_PARAMETER: u8 = 0x16;
pub const THROWS: u8 = 0x17;
pub const LOCAL_VARIABLE: u8 = 0x40;
pub const RESOURCE_VARIABLE: u8 = 0x41;
pub const EXCEPTION_PARAMETER: u8 = 0x42;
pub const INSTANCE_OF: u8 = 0x43;
pub const NEW: u8 = 0x44;
pub const CONSTRUCTOR_REFERENCE: u8 = 0x45;
pub const METHOD_REFERENCE: u8 = 0x46;
pub const CAST: u8 = 0x47;
pub const CONSTRUCTOR_INVOCATION_TYPE_ARGUMENT: u8 = 0x48;
pub const METHOD_INVOCATION_TYPE_ARGUMENT: u8 = 0x49;
pub const CONSTRUCTOR_REFERENCE_TYPE_ARGUMENT: u8 = 0x4A;
pub const METHOD_REFERENCE_TYPE_ARGUMENT: u8 = 0x4B;
