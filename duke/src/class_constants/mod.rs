//! Numeric and string constants defined by the Java Virtual Machine Specification: the class
//! file magic number, constant pool tags, attribute names, opcodes, `newarray` type codes and
//! type-annotation target-type bytes.

pub mod atype;
pub mod attribute;
pub mod opcode;
pub mod pool;
pub mod type_annotation;

/// The magic number `0xCAFEBABE` every class file starts with (JVMS 4.1).
pub const MAGIC: u32 = 0xCAFE_BABE;
