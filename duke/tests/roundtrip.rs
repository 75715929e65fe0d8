use std::io::Cursor;
use anyhow::Result;
use pretty_assertions::assert_eq;
use raw_class_file::{flags, insn, AttributeInfo, ClassFile as RawClassFile, CpInfo, LineNumberTableEntry, MethodInfo};

/// The class `javac` produces for
/// ```java,ignore
/// package org.example;
///
/// class Main {}
/// ```
fn hello_world_bytes() -> Vec<u8> {
	let class = RawClassFile {
		minor_version: 0,
		major_version: 52,
		constant_pool: vec![
			CpInfo::Methodref { class_index: 3, name_and_type_index: 10 },
			CpInfo::Class { name_index: 11 },
			CpInfo::Class { name_index: 12 },
			CpInfo::Utf8 { bytes: b"<init>".to_vec() },
			CpInfo::Utf8 { bytes: b"()V".to_vec() },
			CpInfo::Utf8 { bytes: b"Code".to_vec() },
			CpInfo::Utf8 { bytes: b"LineNumberTable".to_vec() },
			CpInfo::Utf8 { bytes: b"SourceFile".to_vec() },
			CpInfo::Utf8 { bytes: b"Main.java".to_vec() },
			CpInfo::NameAndType { name_index: 4, descriptor_index: 5 },
			CpInfo::Utf8 { bytes: b"org/example/Main".to_vec() },
			CpInfo::Utf8 { bytes: b"java/lang/Object".to_vec() },
		],
		access_flags: flags::ACC_SUPER,
		this_class: 2,
		super_class: 3,
		interfaces: vec![],
		fields: vec![],
		methods: vec![
			MethodInfo {
				access_flags: 0,
				name_index: 4,
				descriptor_index: 5,
				attributes: vec![
					AttributeInfo::Code {
						attribute_name_index: 6,
						max_stack: 1,
						max_locals: 1,
						code: vec![
							insn::aload_0,
							insn::invokespecial, 0, 1,
							insn::r#return,
						],
						exception_table: vec![],
						attributes: vec![
							AttributeInfo::LineNumberTable {
								attribute_name_index: 7,
								line_number_table: vec![
									LineNumberTableEntry { start_pc: 0, line_number: 3 },
								],
							}
						],
					},
				],
			}
		],
		attributes: vec![
			AttributeInfo::SourceFile {
				attribute_name_index: 8,
				sourcefile_index: 9,
			}
		],
	};

	class.to_bytes()
}

/// Reading a class and writing it back out with no transformer in between must reproduce the
/// exact same bytes: nothing is allowed to pick a "nicer" encoding on its own.
#[test]
fn hello_world_round_trips_byte_for_byte() -> Result<()> {
	let bytes = hello_world_bytes();

	let class = duke::read_class(&mut Cursor::new(&bytes))?;

	let mut written = Vec::new();
	duke::write_class(&mut written, &class)?;

	assert_eq!(bytes, written);

	Ok(())
}

#[test]
fn hello_world_has_the_expected_shape() -> Result<()> {
	let bytes = hello_world_bytes();
	let class = duke::read_class(&mut Cursor::new(&bytes))?;

	assert_eq!(class.name, duke::tree::class::ClassName::from("org/example/Main"));
	assert_eq!(class.super_class, Some(duke::tree::class::ClassName::from("java/lang/Object")));
	assert_eq!(class.methods.len(), 1);
	assert_eq!(class.fields.len(), 0);

	Ok(())
}
