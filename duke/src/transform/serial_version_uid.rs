//! Computes the default `serialVersionUID` the JVM serialization mechanism would assign to a
//! class that doesn't declare one explicitly, following the algorithm documented for
//! `java.io.ObjectStreamClass` (the SHA-based "stream unique identifier" computation).
//!
//! This implements the algorithm as it stood before JDK 14 (no special-casing for records or
//! sealed classes, which the JDK added afterwards): it hashes the class name, a filtered set of
//! class modifiers, the sorted interface list, a filtered and sorted set of fields, an optional
//! synthesized `<clinit>` entry, and sorted constructors/methods, using `SHA-1` and folding the
//! first eight digest bytes into a little-endian `i64`.

use sha1::{Digest, Sha1};
use crate::tree::class::ClassFile;
use crate::tree::field::Field;
use crate::tree::method::{Method, MethodName};

const CLASS_MODIFIERS_MASK: u16 = 0x0001 | 0x0010 | 0x0200 | 0x0400; // public, final, interface, abstract
const FIELD_MODIFIERS_MASK: u16 = 0x0001 | 0x0002 | 0x0004 | 0x0008 | 0x0010 | 0x0040 | 0x0080; // public, private, protected, static, final, volatile, transient
const METHOD_MODIFIERS_MASK: u16 = 0x0001 | 0x0002 | 0x0004 | 0x0008 | 0x0010 | 0x0020 | 0x0100 | 0x0400 | 0x0800; // public, private, protected, static, final, synchronized, native, abstract, strict

const PRIVATE: u16 = 0x0002;
const STATIC: u16 = 0x0008;
const TRANSIENT: u16 = 0x0080;

/// Accumulates bytes the same way `java.io.DataOutputStream` would, for hashing.
#[derive(Default)]
struct Buf(Vec<u8>);

impl Buf {
	fn utf(&mut self, string: &java_string::JavaStr) {
		let bytes = crate::jstring::from_string_to_vec(string);
		self.0.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
		self.0.extend_from_slice(&bytes);
	}
	fn utf_dots(&mut self, string: &java_string::JavaStr) {
		let replaced = string.replace('/', ".");
		self.utf(&replaced);
	}
	fn int(&mut self, value: u32) {
		self.0.extend_from_slice(&value.to_be_bytes());
	}
}

/// Computes the default `serialVersionUID` `cl` would be assigned if it doesn't declare one of
/// its own.
pub fn compute_default_suid(cl: &ClassFile) -> i64 {
	let mut buf = Buf::default();

	buf.utf(&cl.name.as_inner().replace('/', "."));

	let mut class_mods = u16::from(cl.access) & CLASS_MODIFIERS_MASK;
	// javac only sets ACC_ABSTRACT on an interface if it declares methods
	const INTERFACE: u16 = 0x0200;
	const ABSTRACT: u16 = 0x0400;
	if class_mods & INTERFACE != 0 {
		class_mods = if !cl.methods.is_empty() { class_mods | ABSTRACT } else { class_mods & !ABSTRACT };
	}
	buf.int(class_mods as u32);

	let mut interface_names: Vec<_> = cl.interfaces.iter().map(|i| i.as_inner().replace('/', ".")).collect();
	interface_names.sort();
	for name in &interface_names {
		buf.utf(name);
	}

	let mut fields: Vec<&Field> = cl.fields.iter().collect();
	fields.sort_by(|a, b| a.name.as_inner().cmp(b.name.as_inner()));
	for field in fields {
		let mods = u16::from(field.access) & FIELD_MODIFIERS_MASK;
		let excluded = mods & PRIVATE != 0 && mods & (STATIC | TRANSIENT) != 0;
		if !excluded {
			buf.utf(field.name.as_inner());
			buf.int(mods as u32);
			buf.utf(field.descriptor.as_inner());
		}
	}

	if cl.methods.iter().any(|m| m.name.as_slice() == MethodName::CLINIT) {
		buf.utf(java_string::JavaStr::from_str("<clinit>"));
		buf.int(STATIC as u32);
		buf.utf(java_string::JavaStr::from_str("()V"));
	}

	let mut constructors: Vec<&Method> = cl.methods.iter().filter(|m| m.name.as_slice() == MethodName::INIT).collect();
	constructors.sort_by(|a, b| a.descriptor.as_inner().cmp(b.descriptor.as_inner()));
	for constructor in constructors {
		let mods = u16::from(constructor.access) & METHOD_MODIFIERS_MASK;
		if mods & PRIVATE == 0 {
			buf.utf(java_string::JavaStr::from_str("<init>"));
			buf.int(mods as u32);
			buf.utf_dots(constructor.descriptor.as_inner());
		}
	}

	let mut methods: Vec<&Method> = cl.methods.iter()
		.filter(|m| m.name.as_slice() != MethodName::INIT && m.name.as_slice() != MethodName::CLINIT)
		.collect();
	methods.sort_by(|a, b| a.name.as_inner().cmp(b.name.as_inner()).then_with(|| a.descriptor.as_inner().cmp(b.descriptor.as_inner())));
	for method in methods {
		let mods = u16::from(method.access) & METHOD_MODIFIERS_MASK;
		if mods & PRIVATE == 0 {
			buf.utf(method.name.as_inner());
			buf.int(mods as u32);
			buf.utf_dots(method.descriptor.as_inner());
		}
	}

	let digest = Sha1::digest(&buf.0);
	let mut bytes = [0u8; 8];
	bytes.copy_from_slice(&digest[0..8]);
	i64::from_le_bytes(bytes)
}

#[cfg(test)]
mod testing {
	use crate::tree::class::{ClassAccess, ClassFile, ClassName};
	use crate::tree::field::{Field, FieldAccess, FieldDescriptor, FieldName};
	use crate::tree::version::Version;
	use super::compute_default_suid;

	/// `{int a; private transient Object b; public String c;}`, no interfaces, no methods: the
	/// fixture value was computed independently by hashing the same byte layout with `sha1sum`.
	#[test]
	fn matches_fixture_for_simple_class() {
		let mut class = ClassFile::new(
			Version::V1_8,
			ClassAccess { is_public: true, ..ClassAccess::default() },
			ClassName::from("Foo"),
			Some(ClassName::JAVA_LANG_OBJECT.to_owned()),
			Vec::new(),
		);
		class.fields = vec![
			Field::new(
				FieldAccess { is_public: true, ..FieldAccess::default() },
				FieldName::from("a"),
				FieldDescriptor::from("I"),
			),
			Field::new(
				FieldAccess { is_private: true, is_transient: true, ..FieldAccess::default() },
				FieldName::from("b"),
				FieldDescriptor::from("Ljava/lang/Object;"),
			),
			Field::new(
				FieldAccess { is_public: true, ..FieldAccess::default() },
				FieldName::from("c"),
				FieldDescriptor::from("Ljava/lang/String;"),
			),
		];

		assert_eq!(compute_default_suid(&class), -5537276360555350442);
	}

	#[test]
	fn excluded_field_does_not_affect_the_hash() {
		let base = || ClassFile::new(
			Version::V1_8,
			ClassAccess { is_public: true, ..ClassAccess::default() },
			ClassName::from("Foo"),
			Some(ClassName::JAVA_LANG_OBJECT.to_owned()),
			Vec::new(),
		);

		let mut without_private_field = base();
		without_private_field.fields = vec![
			Field::new(FieldAccess { is_public: true, ..FieldAccess::default() }, FieldName::from("a"), FieldDescriptor::from("I")),
			Field::new(FieldAccess { is_public: true, ..FieldAccess::default() }, FieldName::from("c"), FieldDescriptor::from("Ljava/lang/String;")),
		];

		let mut with_private_transient_field = base();
		with_private_transient_field.fields = vec![
			Field::new(FieldAccess { is_public: true, ..FieldAccess::default() }, FieldName::from("a"), FieldDescriptor::from("I")),
			Field::new(FieldAccess { is_private: true, is_transient: true, ..FieldAccess::default() }, FieldName::from("b"), FieldDescriptor::from("Ljava/lang/Object;")),
			Field::new(FieldAccess { is_public: true, ..FieldAccess::default() }, FieldName::from("c"), FieldDescriptor::from("Ljava/lang/String;")),
		];

		assert_eq!(compute_default_suid(&without_private_field), compute_default_suid(&with_private_transient_field));
	}
}
