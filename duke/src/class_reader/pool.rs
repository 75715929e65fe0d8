use anyhow::{anyhow, bail, Context, Result};
use java_string::JavaString;
use crate::class_constants::pool;
use crate::class_constants::pool::method_handle_reference;
use crate::{ClassRead, jstring};
use crate::tree::class::{ClassName, ObjClassName};
use crate::tree::field::{ConstantValue, FieldDescriptor, FieldName, FieldRef};
use crate::tree::method::{MethodDescriptor, MethodName, MethodNameAndDesc, MethodRef};
use crate::tree::method::code::{ConstantDynamic, Handle, InvokeDynamic, Loadable};
use crate::tree::module::{ModuleName, PackageName};

/// A bootstrap method, as read from the `BootstrapMethods` attribute. The arguments are kept as
/// raw pool indices, since resolving a [`Loadable::Dynamic`] argument might in turn need to look
/// another bootstrap method up, before the `BootstrapMethods` attribute is fully read.
#[derive(Debug, Clone)]
pub(crate) struct BootstrapMethodRead {
	pub(crate) handle: Handle,
	pub(crate) arguments: Vec<u16>,
}

#[derive(Debug, Clone)]
enum RawEntry {
	Utf8(JavaString),
	Integer(i32),
	Float(u32),
	Long(i64),
	Double(u64),
	Class { name_index: u16 },
	String { string_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16 },
	InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
	NameAndType { name_index: u16, descriptor_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	Module { name_index: u16 },
	Package { name_index: u16 },
	/// The upper half of a [`RawEntry::Long`] or [`RawEntry::Double`] entry. JVMS 4.4.5: "for
	/// historical reasons" these occupy two pool indices, and the second one must not be used.
	Padding,
}

/// The constant pool of a class file, read once up front so that entries referenced via forward
/// references (which are legal, see JVMS 4.4) can be resolved at any time.
#[derive(Debug)]
pub(crate) struct PoolRead {
	/// Indexed directly by pool index; index `0` and the upper half of any long/double entry are
	/// [`RawEntry::Padding`] and never resolved.
	entries: Vec<RawEntry>,
}

impl PoolRead {
	pub(crate) fn read(reader: &mut impl ClassRead) -> Result<PoolRead> {
		let count = reader.read_u16()?;

		let mut entries = Vec::with_capacity(count as usize);
		entries.push(RawEntry::Padding); // index 0 is never used

		let mut index = 1;
		while index < count {
			let tag = reader.read_u8()?;
			let entry = match tag {
				pool::UTF8 => {
					let length = reader.read_u16_as_usize()?;
					RawEntry::Utf8(jstring::from_vec_to_string(reader.read_u8_vec(length)?)?)
				},
				pool::INTEGER => RawEntry::Integer(reader.read_i32()?),
				pool::FLOAT => RawEntry::Float(reader.read_u32()?),
				pool::LONG => RawEntry::Long(reader.read_i64()?),
				pool::DOUBLE => RawEntry::Double(reader.read_i64()? as u64),
				pool::CLASS => RawEntry::Class { name_index: reader.read_u16()? },
				pool::STRING => RawEntry::String { string_index: reader.read_u16()? },
				pool::FIELD_REF => RawEntry::FieldRef {
					class_index: reader.read_u16()?,
					name_and_type_index: reader.read_u16()?,
				},
				pool::METHOD_REF => RawEntry::MethodRef {
					class_index: reader.read_u16()?,
					name_and_type_index: reader.read_u16()?,
				},
				pool::INTERFACE_METHOD_REF => RawEntry::InterfaceMethodRef {
					class_index: reader.read_u16()?,
					name_and_type_index: reader.read_u16()?,
				},
				pool::NAME_AND_TYPE => RawEntry::NameAndType {
					name_index: reader.read_u16()?,
					descriptor_index: reader.read_u16()?,
				},
				pool::METHOD_HANDLE => RawEntry::MethodHandle {
					reference_kind: reader.read_u8()?,
					reference_index: reader.read_u16()?,
				},
				pool::METHOD_TYPE => RawEntry::MethodType { descriptor_index: reader.read_u16()? },
				pool::DYNAMIC => RawEntry::Dynamic {
					bootstrap_method_attr_index: reader.read_u16()?,
					name_and_type_index: reader.read_u16()?,
				},
				pool::INVOKE_DYNAMIC => RawEntry::InvokeDynamic {
					bootstrap_method_attr_index: reader.read_u16()?,
					name_and_type_index: reader.read_u16()?,
				},
				pool::MODULE => RawEntry::Module { name_index: reader.read_u16()? },
				pool::PACKAGE => RawEntry::Package { name_index: reader.read_u16()? },
				_ => bail!("unknown constant pool tag {tag} at index {index}"),
			};

			let takes_two_slots = matches!(entry, RawEntry::Long(_) | RawEntry::Double(_));

			entries.push(entry);
			index += 1;

			if takes_two_slots {
				entries.push(RawEntry::Padding);
				index += 1;
			}
		}

		Ok(PoolRead { entries })
	}

	fn get_raw(&self, index: u16) -> Result<&RawEntry> {
		match self.entries.get(index as usize) {
			None | Some(RawEntry::Padding) => bail!("invalid constant pool index {index}"),
			Some(entry) => Ok(entry),
		}
	}

	fn get_name_and_type(&self, index: u16) -> Result<(JavaString, JavaString)> {
		match self.get_raw(index)? {
			&RawEntry::NameAndType { name_index, descriptor_index } =>
				Ok((self.get_utf8(name_index)?, self.get_utf8(descriptor_index)?)),
			other => bail!("expected a NameAndType entry at index {index}, got {other:?}"),
		}
	}

	fn get_obj_class(&self, index: u16) -> Result<ObjClassName> {
		match self.get_raw(index)? {
			&RawEntry::Class { name_index } => Ok(ObjClassName::try_from(self.get_utf8(name_index)?)?),
			other => bail!("expected a Class entry at index {index}, got {other:?}"),
		}
	}

	/// Resolves a bootstrap method and its arguments, referenced by its index into the
	/// `BootstrapMethods` attribute (not a constant pool index).
	fn get_bootstrap_method(&self, index: u16, bootstrap_methods: &Option<Vec<BootstrapMethodRead>>) -> Result<(Handle, Vec<Loadable>)> {
		let methods = bootstrap_methods.as_ref()
			.with_context(|| anyhow!("a Dynamic or InvokeDynamic constant pool entry was used, but no BootstrapMethods attribute was present"))?;
		let method = methods.get(index as usize)
			.with_context(|| anyhow!("bootstrap method attribute index {index} out of bounds"))?;

		let arguments = method.arguments.iter()
			.map(|&argument| self.get_loadable(argument, bootstrap_methods))
			.collect::<Result<Vec<_>>>()?;

		Ok((method.handle.clone(), arguments))
	}

	pub(crate) fn get_utf8(&self, index: u16) -> Result<JavaString> {
		self.get_utf8_ref(index).map(Clone::clone)
	}

	pub(crate) fn get_utf8_ref(&self, index: u16) -> Result<&JavaString> {
		match self.get_raw(index)? {
			RawEntry::Utf8(string) => Ok(string),
			other => bail!("expected a Utf8 entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_class(&self, index: u16) -> Result<ClassName> {
		match self.get_raw(index)? {
			&RawEntry::Class { name_index } => Ok(ClassName::from(self.get_utf8(name_index)?)),
			other => bail!("expected a Class entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_package(&self, index: u16) -> Result<PackageName> {
		match self.get_raw(index)? {
			&RawEntry::Package { name_index } => Ok(PackageName::try_from(self.get_utf8(name_index)?)?),
			other => bail!("expected a Package entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_module(&self, index: u16) -> Result<ModuleName> {
		match self.get_raw(index)? {
			&RawEntry::Module { name_index } => Ok(ModuleName::try_from(self.get_utf8(name_index)?)?),
			other => bail!("expected a Module entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_method_name_and_type(&self, index: u16) -> Result<MethodNameAndDesc> {
		let (name, desc) = self.get_name_and_type(index)?;
		Ok(MethodNameAndDesc {
			name: MethodName::try_from(name)?,
			desc: MethodDescriptor::try_from(desc)?,
		})
	}

	pub(crate) fn get_field_ref(&self, index: u16) -> Result<FieldRef> {
		match self.get_raw(index)? {
			&RawEntry::FieldRef { class_index, name_and_type_index } => {
				let class = self.get_obj_class(class_index)?;
				let (name, desc) = self.get_name_and_type(name_and_type_index)?;
				Ok(FieldRef { class, name: FieldName::try_from(name)?, desc: FieldDescriptor::try_from(desc)? })
			},
			other => bail!("expected a FieldRef entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_method_ref(&self, index: u16) -> Result<MethodRef> {
		match self.get_raw(index)? {
			&RawEntry::MethodRef { class_index, name_and_type_index } => {
				let class = self.get_class(class_index)?;
				let (name, desc) = self.get_name_and_type(name_and_type_index)?;
				Ok(MethodRef { class, name: MethodName::try_from(name)?, desc: MethodDescriptor::try_from(desc)? })
			},
			other => bail!("expected a MethodRef entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_interface_method_ref(&self, index: u16) -> Result<MethodRef> {
		match self.get_raw(index)? {
			&RawEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
				let class = self.get_class(class_index)?;
				let (name, desc) = self.get_name_and_type(name_and_type_index)?;
				Ok(MethodRef { class, name: MethodName::try_from(name)?, desc: MethodDescriptor::try_from(desc)? })
			},
			other => bail!("expected an InterfaceMethodRef entry at index {index}, got {other:?}"),
		}
	}

	/// `true` indicates an [`RawEntry::InterfaceMethodRef`] was read, `false` that it was a
	/// [`RawEntry::MethodRef`].
	pub(crate) fn get_method_ref_or_interface_method_ref(&self, index: u16) -> Result<(MethodRef, bool)> {
		let (is_interface, class_index, name_and_type_index) = match self.get_raw(index)? {
			&RawEntry::MethodRef { class_index, name_and_type_index } => (false, class_index, name_and_type_index),
			&RawEntry::InterfaceMethodRef { class_index, name_and_type_index } => (true, class_index, name_and_type_index),
			other => bail!("expected a MethodRef or InterfaceMethodRef entry at index {index}, got {other:?}"),
		};

		let class = self.get_class(class_index)?;
		let (name, desc) = self.get_name_and_type(name_and_type_index)?;
		Ok((MethodRef { class, name: MethodName::try_from(name)?, desc: MethodDescriptor::try_from(desc)? }, is_interface))
	}

	pub(crate) fn get_integer(&self, index: u16) -> Result<i32> {
		match self.get_raw(index)? {
			&RawEntry::Integer(value) => Ok(value),
			other => bail!("expected an Integer entry at index {index}, got {other:?}"),
		}
	}
	pub(crate) fn get_integer_as_byte(&self, index: u16) -> Result<i8> {
		let value = self.get_integer(index)?;
		i8::try_from(value).with_context(|| anyhow!("integer constant {value} out of range for byte"))
	}
	pub(crate) fn get_integer_as_char(&self, index: u16) -> Result<u16> {
		let value = self.get_integer(index)?;
		u16::try_from(value).with_context(|| anyhow!("integer constant {value} out of range for char"))
	}
	pub(crate) fn get_integer_as_short(&self, index: u16) -> Result<i16> {
		let value = self.get_integer(index)?;
		i16::try_from(value).with_context(|| anyhow!("integer constant {value} out of range for short"))
	}
	pub(crate) fn get_integer_as_boolean(&self, index: u16) -> Result<bool> {
		Ok(self.get_integer(index)? != 0)
	}

	pub(crate) fn get_float(&self, index: u16) -> Result<f32> {
		match self.get_raw(index)? {
			&RawEntry::Float(bits) => Ok(f32::from_bits(bits)),
			other => bail!("expected a Float entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_long(&self, index: u16) -> Result<i64> {
		match self.get_raw(index)? {
			&RawEntry::Long(value) => Ok(value),
			other => bail!("expected a Long entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_double(&self, index: u16) -> Result<f64> {
		match self.get_raw(index)? {
			&RawEntry::Double(bits) => Ok(f64::from_bits(bits)),
			other => bail!("expected a Double entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_constant_value(&self, index: u16) -> Result<ConstantValue> {
		match self.get_raw(index)? {
			&RawEntry::Integer(value) => Ok(ConstantValue::Integer(value)),
			&RawEntry::Float(bits) => Ok(ConstantValue::Float(f32::from_bits(bits))),
			&RawEntry::Long(value) => Ok(ConstantValue::Long(value)),
			&RawEntry::Double(bits) => Ok(ConstantValue::Double(f64::from_bits(bits))),
			&RawEntry::String { string_index } => Ok(ConstantValue::String(self.get_utf8(string_index)?)),
			other => bail!("expected a ConstantValue-eligible entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_method_handle(&self, index: u16) -> Result<Handle> {
		match self.get_raw(index)? {
			&RawEntry::MethodHandle { reference_kind, reference_index } => Ok(match reference_kind {
				method_handle_reference::GET_FIELD => Handle::GetField(self.get_field_ref(reference_index)?),
				method_handle_reference::GET_STATIC => Handle::GetStatic(self.get_field_ref(reference_index)?),
				method_handle_reference::PUT_FIELD => Handle::PutField(self.get_field_ref(reference_index)?),
				method_handle_reference::PUT_STATIC => Handle::PutStatic(self.get_field_ref(reference_index)?),
				method_handle_reference::INVOKE_VIRTUAL => Handle::InvokeVirtual(self.get_method_ref(reference_index)?),
				method_handle_reference::INVOKE_STATIC => {
					let (method, is_interface) = self.get_method_ref_or_interface_method_ref(reference_index)?;
					Handle::InvokeStatic(method, is_interface)
				},
				method_handle_reference::INVOKE_SPECIAL => {
					let (method, is_interface) = self.get_method_ref_or_interface_method_ref(reference_index)?;
					Handle::InvokeSpecial(method, is_interface)
				},
				method_handle_reference::NEW_INVOKE_SPECIAL => Handle::NewInvokeSpecial(self.get_method_ref(reference_index)?),
				method_handle_reference::INVOKE_INTERFACE => Handle::InvokeInterface(self.get_interface_method_ref(reference_index)?),
				other => bail!("unknown method handle reference_kind {other} at index {index}"),
			}),
			other => bail!("expected a MethodHandle entry at index {index}, got {other:?}"),
		}
	}

	pub(crate) fn get_loadable(&self, index: u16, bootstrap_methods: &Option<Vec<BootstrapMethodRead>>) -> Result<Loadable> {
		match self.get_raw(index)? {
			&RawEntry::Integer(value) => Ok(Loadable::Integer(value)),
			&RawEntry::Float(bits) => Ok(Loadable::Float(f32::from_bits(bits))),
			&RawEntry::Long(value) => Ok(Loadable::Long(value)),
			&RawEntry::Double(bits) => Ok(Loadable::Double(f64::from_bits(bits))),
			&RawEntry::Class { name_index } => Ok(Loadable::Class(ClassName::from(self.get_utf8(name_index)?))),
			&RawEntry::String { string_index } => Ok(Loadable::String(self.get_utf8(string_index)?)),
			RawEntry::MethodHandle { .. } => Ok(Loadable::MethodHandle(self.get_method_handle(index)?)),
			&RawEntry::MethodType { descriptor_index } =>
				Ok(Loadable::MethodType(MethodDescriptor::try_from(self.get_utf8(descriptor_index)?)?)),
			&RawEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } => {
				let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
				let (handle, arguments) = self.get_bootstrap_method(bootstrap_method_attr_index, bootstrap_methods)?;
				Ok(Loadable::Dynamic(ConstantDynamic {
					name: FieldName::try_from(name)?,
					descriptor: FieldDescriptor::try_from(descriptor)?,
					handle,
					arguments,
				}))
			},
			other => bail!("not a loadable constant pool entry at index {index}: {other:?}"),
		}
	}

	pub(crate) fn get_invoke_dynamic(&self, index: u16, bootstrap_methods: &Option<Vec<BootstrapMethodRead>>) -> Result<InvokeDynamic> {
		match self.get_raw(index)? {
			&RawEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
				let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
				let (handle, arguments) = self.get_bootstrap_method(bootstrap_method_attr_index, bootstrap_methods)?;
				Ok(InvokeDynamic {
					name: MethodName::try_from(name)?,
					descriptor: MethodDescriptor::try_from(descriptor)?,
					handle,
					arguments,
				})
			},
			other => bail!("expected an InvokeDynamic entry at index {index}, got {other:?}"),
		}
	}

	/// Returns `None` if `index` is `0`, the conventional way of encoding an absent optional
	/// reference (e.g. a class with no superclass, or an anonymous inner class with no name).
	pub(crate) fn get_optional<T>(&self, index: u16, f: impl Fn(&PoolRead, u16) -> Result<T>) -> Result<Option<T>> {
		if index == 0 {
			Ok(None)
		} else {
			Ok(Some(f(self, index)?))
		}
	}
}
