//! Constant pool entry tags, JVMS 4.4.

pub const UTF8: u8 = 1;
pub const INTEGER: u8 = 3;
pub const FLOAT: u8 = 4;
pub const LONG: u8 = 5;
pub const DOUBLE: u8 = 6;
pub const CLASS: u8 = 7;
pub const STRING: u8 = 8;
pub const FIELD_REF: u8 = 9;
pub const METHOD_REF: u8 = 10;
pub const INTERFACE_METHOD_REF: u8 = 11;
pub const NAME_AND_TYPE: u8 = 12;
pub const METHOD_HANDLE: u8 = 15;
pub const METHOD_TYPE: u8 = 16;
pub const DYNAMIC: u8 = 17;
pub const INVOKE_DYNAMIC: u8 = 18;
pub const MODULE: u8 = 19;
pub const PACKAGE: u8 = 20;

/// `reference_kind` values of a `CONSTANT_MethodHandle_info`, JVMS 4.4.8.
pub mod method_handle_reference {
	pub const GET_FIELD: u8 = 1;
	pub const GET_STATIC: u8 = 2;
	pub const PUT_FIELD: u8 = 3;
	pub const PUT_STATIC: u8 = 4;
	pub const INVOKE_VIRTUAL: u8 = 5;
	pub const INVOKE_STATIC: u8 = 6;
	pub const INVOKE_SPECIAL: u8 = 7;
	pub const NEW_INVOKE_SPECIAL: u8 = 8;
	pub const INVOKE_INTERFACE: u8 = 9;
}
