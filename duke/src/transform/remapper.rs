//! A uniform name/descriptor/signature rewrite pass over the owned tree.
//!
//! A [`Remapper`] answers "what is the new name of X", for every place a name can occur in a
//! class file: the class itself, its fields and methods, invokedynamic call sites, record
//! components, module/package declarations and annotation attribute names. The free functions in
//! this module (`remap_class_file` and friends) walk an owned [`ClassFile`] and every nested
//! structure, routing each name, descriptor and signature through the [`Remapper`] before
//! rebuilding the tree.
//!
//! This is a from-scratch, in-`duke` version of a pattern already used one workspace layer up to
//! remap whole jars: that pass (a `Mappable`/`MappableWithClassName` trait pair) is keyed to its
//! own jar/class-index abstraction and leaves signatures, inner-class names, local variable
//! names, and module/record-component data unmapped. The functions here cover that surface
//! completely and depend on nothing outside `duke`.

use anyhow::Result;
use java_string::{JavaCodePoint, JavaStr, JavaString};
use crate::tree::annotation::{Annotation, ElementValue, ElementValuePair};
use crate::tree::class::{ClassFile, ClassName, ClassNameSlice, ClassSignature, ClassSignatureSlice, EnclosingMethod, InnerClass, ObjClassName};
use crate::tree::descriptor::{ArrayType, ParsedFieldDescriptor, ParsedMethodDescriptor, ParsedReturnDescriptor, Type};
use crate::tree::field::{Field, FieldDescriptor, FieldDescriptorSlice, FieldName, FieldNameSlice, FieldRef, FieldSignature, FieldSignatureSlice};
use crate::tree::method::{Method, MethodDescriptor, MethodDescriptorSlice, MethodName, MethodNameSlice, MethodNameAndDesc, MethodParameter, MethodRef, MethodSignature, MethodSignatureSlice};
use crate::tree::method::code::{Code, ConstantDynamic, Exception, Handle, Instruction, InstructionListEntry, InvokeDynamic, LocalVariableName, LocalVariableNameSlice, Loadable, Lv};
use crate::tree::module::{Module, ModuleExports, ModuleName, ModuleNameSlice, ModuleOpens, ModuleProvides, ModuleRequires, PackageName, PackageNameSlice};
use crate::tree::record::{RecordComponent, RecordName, RecordNameSlice};
use crate::tree::signature::{
	ClassTypeSignature, FieldTypeSignature, FormalTypeParameter, ParsedClassSignature, ParsedFieldSignature, ParsedMethodSignature,
	SimpleClassTypeSignature, ThrowsSignature, TypeArgument, TypeSignature,
};
use crate::tree::type_annotation::TypeAnnotation;
use crate::visitor::method::code::{StackMapData, VerificationTypeInfo};

/// Rewrites every name, descriptor and signature a class file can carry.
///
/// Every method has a sensible default (usually: leave the name alone), so an implementor that
/// only cares about class names needs to override [`Remapper::map`] and nothing else.
pub trait Remapper {
	/// Maps an internal (`/`-separated) class or array-class name, e.g. `java/lang/Object` or
	/// `[Ljava/lang/String;`. This is the one method every implementor must provide; every other
	/// default method on this trait, and every free function in this module, is ultimately
	/// expressed in terms of it.
	fn map(&self, internal_name: &ClassNameSlice) -> Result<ClassName>;

	/// Maps the name of a field declared on (or referenced through) `owner`.
	fn map_field_name(&self, owner: &ClassName, name: &FieldNameSlice, desc: &FieldDescriptorSlice) -> Result<FieldName> {
		let _ = (owner, desc);
		Ok(name.to_owned())
	}

	/// Maps the name of a method declared on (or referenced through) `owner`.
	fn map_method_name(&self, owner: &ClassName, name: &MethodNameSlice, desc: &MethodDescriptorSlice) -> Result<MethodName> {
		let _ = (owner, desc);
		Ok(name.to_owned())
	}

	/// Maps the name used as the bootstrap target of an `invokedynamic` call site. These don't
	/// have an owning class (the "owner" is the constant pool's bootstrap method table), so there
	/// is no `owner` parameter.
	fn map_invoke_dynamic_method_name(&self, name: &MethodNameSlice, desc: &MethodDescriptorSlice) -> Result<MethodName> {
		let _ = desc;
		Ok(name.to_owned())
	}

	/// Maps the name of a record component declared on `owner`.
	fn map_record_component_name(&self, owner: &ClassName, name: &RecordNameSlice, desc: &FieldDescriptorSlice) -> Result<RecordName> {
		let _ = (owner, desc);
		Ok(name.to_owned())
	}

	/// Maps a package name, as it appears in a module's `exports`/`opens` directives.
	fn map_package_name(&self, name: &PackageNameSlice) -> Result<PackageName> {
		Ok(name.to_owned())
	}

	/// Maps a module name, as it appears in a module declaration or its `requires` directives.
	fn map_module_name(&self, name: &ModuleNameSlice) -> Result<ModuleName> {
		Ok(name.to_owned())
	}

	/// Maps the name of a local variable or local variable debug name. Not one of the JVMS-level
	/// identifiers the other `map_*_name` methods cover (it never appears in a constant pool
	/// entry other kinds of references point at), but remapping it is occasionally useful when
	/// the remapper is also renaming source-level identifiers, not just binary ones.
	fn map_local_variable_name(&self, name: &LocalVariableNameSlice) -> Result<LocalVariableName> {
		Ok(name.to_owned())
	}

	/// Maps the name of an annotation element (the left-hand side of an `ElementValuePair`).
	fn map_annotation_attribute_name(&self, name: &JavaStr) -> Result<JavaString> {
		Ok(name.to_owned())
	}

	/// Maps a field descriptor by walking its grammar and routing every object/array class name
	/// it contains through [`Remapper::map`].
	fn map_desc(&self, desc: &FieldDescriptorSlice) -> Result<FieldDescriptor> {
		let ParsedFieldDescriptor(ty) = desc.parse()?;
		Ok(ParsedFieldDescriptor(remap_type(self, ty)?).write())
	}

	/// Maps a method descriptor by walking its grammar and routing every object/array class name
	/// it contains through [`Remapper::map`].
	fn map_method_desc(&self, desc: &MethodDescriptorSlice) -> Result<MethodDescriptor> {
		let parsed = desc.parse()?;
		let parameter_descriptors = parsed.parameter_descriptors.into_iter()
			.map(|ty| remap_type(self, ty))
			.collect::<Result<Vec<_>>>()?;
		let return_descriptor = parsed.return_descriptor.map(|ty| remap_type(self, ty)).transpose()?;
		Ok(ParsedMethodDescriptor { parameter_descriptors, return_descriptor }.write())
	}

	/// Maps a return descriptor (the part of a method descriptor after the closing `)`, also used
	/// standalone for a `Class`-kind annotation element value).
	fn map_return_desc(&self, desc: &crate::tree::descriptor::ReturnDescriptorSlice) -> Result<crate::tree::descriptor::ReturnDescriptor> {
		let ParsedReturnDescriptor(ty) = desc.parse()?;
		let ty = ty.map(|ty| remap_type(self, ty)).transpose()?;
		Ok(ParsedReturnDescriptor(ty).write())
	}

	/// Maps a class signature (the generic superclass/superinterfaces and formal type parameters
	/// of a class).
	fn map_class_signature(&self, signature: &ClassSignatureSlice) -> Result<ClassSignature> {
		let parsed = signature.parse()?;
		Ok(remap_class_signature(self, parsed)?.write())
	}

	/// Maps a method signature (the generic parameter/return/throws types and formal type
	/// parameters of a method).
	fn map_method_signature(&self, signature: &MethodSignatureSlice) -> Result<MethodSignature> {
		let parsed = signature.parse()?;
		Ok(remap_method_signature(self, parsed)?.write())
	}

	/// Maps a field signature (the generic type of a field or local variable).
	fn map_field_signature(&self, signature: &FieldSignatureSlice) -> Result<FieldSignature> {
		let parsed = signature.parse()?;
		Ok(remap_field_signature(self, parsed)?.write())
	}

	/// A single entry point covering both of the above: `is_type_signature` selects the
	/// field/local-variable grammar (just one [`crate::tree::signature::FieldTypeSignature`]) over
	/// the class-or-method grammar (formal type parameters plus either a superclass/superinterface
	/// list or a parameter/return/throws list). For the latter, the two grammars are distinguished
	/// structurally: after an optional leading `<...>` formal-type-parameter block, a method
	/// signature continues with `(`, a class signature does not.
	fn map_signature(&self, signature: &JavaStr, is_type_signature: bool) -> Result<JavaString> {
		let is_method_signature = !is_type_signature && looks_like_method_signature(signature);
		if is_type_signature {
			// SAFETY: an invalid signature is caught by `parse()` inside `map_field_signature`,
			// not by this cast -- the slice types are thin, unchecked views for parsing purposes.
			let signature = unsafe { FieldSignatureSlice::from_inner_unchecked(signature) };
			Ok(self.map_field_signature(signature)?.into_inner())
		} else if is_method_signature {
			let signature = unsafe { MethodSignatureSlice::from_inner_unchecked(signature) };
			Ok(self.map_method_signature(signature)?.into_inner())
		} else {
			let signature = unsafe { ClassSignatureSlice::from_inner_unchecked(signature) };
			Ok(self.map_class_signature(signature)?.into_inner())
		}
	}
}

/// Whether `signature`, after skipping an optional leading `<FormalTypeParameters>` block, starts
/// with `(` -- the one piece of lookahead needed to tell a method signature from a class
/// signature, since both share the same formal-type-parameter prefix grammar.
fn looks_like_method_signature(signature: &JavaStr) -> bool {
	let lt = JavaCodePoint::from_char('<');
	let gt = JavaCodePoint::from_char('>');
	let open_paren = JavaCodePoint::from_char('(');

	let mut chars = signature.chars();
	match chars.next() {
		Some(c) if c == lt => {
			let mut depth = 1u32;
			for c in chars.by_ref() {
				if c == lt {
					depth += 1;
				} else if c == gt {
					depth -= 1;
					if depth == 0 {
						break;
					}
				}
			}
			chars.next() == Some(open_paren)
		}
		Some(c) => c == open_paren,
		None => false,
	}
}

fn remap_type<R: Remapper + ?Sized>(remapper: &R, ty: Type) -> Result<Type> {
	Ok(match ty {
		Type::Object(name) => Type::Object(remapper.map(&name)?),
		Type::Array(dimensions, element) => Type::Array(dimensions, remap_array_type(remapper, element)?),
		primitive => primitive,
	})
}

fn remap_array_type<R: Remapper + ?Sized>(remapper: &R, ty: ArrayType) -> Result<ArrayType> {
	Ok(match ty {
		ArrayType::Object(name) => ArrayType::Object(remapper.map(&name)?),
		primitive => primitive,
	})
}

fn remap_field_type_signature<R: Remapper + ?Sized>(remapper: &R, sig: FieldTypeSignature) -> Result<FieldTypeSignature> {
	Ok(match sig {
		FieldTypeSignature::Class(cts) => FieldTypeSignature::Class(remap_class_type_signature(remapper, cts)?),
		FieldTypeSignature::TypeVariable(name) => FieldTypeSignature::TypeVariable(name),
	})
}

/// Remaps the outermost internal name of a `ClassTypeSignature` and recurses into its type
/// arguments. The simple names making up `suffix` (statically nested classes) are left alone --
/// like the JVMS grammar itself, they're only meaningful relative to the (already remapped)
/// outer class, and aren't independently addressable internal names.
fn remap_class_type_signature<R: Remapper + ?Sized>(remapper: &R, sig: ClassTypeSignature) -> Result<ClassTypeSignature> {
	let name = remapper.map(&ClassName::from(sig.name))?.into_inner();
	let type_arguments = sig.type_arguments.into_iter().map(|arg| remap_type_argument(remapper, arg)).collect::<Result<Vec<_>>>()?;
	let suffix = sig.suffix.into_iter().map(|s| -> Result<_> {
		Ok(SimpleClassTypeSignature {
			name: s.name,
			type_arguments: s.type_arguments.into_iter().map(|arg| remap_type_argument(remapper, arg)).collect::<Result<Vec<_>>>()?,
		})
	}).collect::<Result<Vec<_>>>()?;
	Ok(ClassTypeSignature { name, type_arguments, suffix })
}

fn remap_type_argument<R: Remapper + ?Sized>(remapper: &R, arg: TypeArgument) -> Result<TypeArgument> {
	Ok(match arg {
		TypeArgument::Wildcard => TypeArgument::Wildcard,
		TypeArgument::Extends(t) => TypeArgument::Extends(Box::new(remap_field_type_signature(remapper, *t)?)),
		TypeArgument::Super(t) => TypeArgument::Super(Box::new(remap_field_type_signature(remapper, *t)?)),
		TypeArgument::Exact(t) => TypeArgument::Exact(Box::new(remap_field_type_signature(remapper, *t)?)),
	})
}

fn remap_type_signature<R: Remapper + ?Sized>(remapper: &R, sig: TypeSignature) -> Result<TypeSignature> {
	Ok(match sig {
		TypeSignature::Base(ty) => TypeSignature::Base(ty),
		TypeSignature::Array(dimensions, element) => TypeSignature::Array(dimensions, Box::new(remap_type_signature(remapper, *element)?)),
		TypeSignature::Field(field) => TypeSignature::Field(remap_field_type_signature(remapper, field)?),
	})
}

fn remap_formal_type_parameter<R: Remapper + ?Sized>(remapper: &R, param: FormalTypeParameter) -> Result<FormalTypeParameter> {
	Ok(FormalTypeParameter {
		name: param.name,
		class_bound: param.class_bound.map(|b| remap_field_type_signature(remapper, b)).transpose()?,
		interface_bounds: param.interface_bounds.into_iter().map(|b| remap_field_type_signature(remapper, b)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_class_signature<R: Remapper + ?Sized>(remapper: &R, sig: ParsedClassSignature) -> Result<ParsedClassSignature> {
	Ok(ParsedClassSignature {
		type_parameters: sig.type_parameters.into_iter().map(|p| remap_formal_type_parameter(remapper, p)).collect::<Result<Vec<_>>>()?,
		super_class: remap_class_type_signature(remapper, sig.super_class)?,
		super_interfaces: sig.super_interfaces.into_iter().map(|i| remap_class_type_signature(remapper, i)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_method_signature<R: Remapper + ?Sized>(remapper: &R, sig: ParsedMethodSignature) -> Result<ParsedMethodSignature> {
	Ok(ParsedMethodSignature {
		type_parameters: sig.type_parameters.into_iter().map(|p| remap_formal_type_parameter(remapper, p)).collect::<Result<Vec<_>>>()?,
		parameter_types: sig.parameter_types.into_iter().map(|t| remap_type_signature(remapper, t)).collect::<Result<Vec<_>>>()?,
		return_type: sig.return_type.map(|t| remap_type_signature(remapper, t)).transpose()?,
		throws: sig.throws.into_iter().map(|t| Ok(match t {
			ThrowsSignature::Class(cts) => ThrowsSignature::Class(remap_class_type_signature(remapper, cts)?),
			ThrowsSignature::TypeVariable(name) => ThrowsSignature::TypeVariable(name),
		})).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_field_signature<R: Remapper + ?Sized>(remapper: &R, sig: ParsedFieldSignature) -> Result<ParsedFieldSignature> {
	Ok(ParsedFieldSignature(remap_field_type_signature(remapper, sig.0)?))
}

fn remap_field_ref<R: Remapper + ?Sized>(remapper: &R, field_ref: FieldRef) -> Result<FieldRef> {
	let original_owner = ClassName::from(field_ref.class);
	let name = remapper.map_field_name(&original_owner, &field_ref.name, &field_ref.desc)?;
	let desc = remapper.map_desc(&field_ref.desc)?;
	let class = ObjClassName::new(remapper.map(&original_owner)?.into_inner())?;
	Ok(FieldRef { class, name, desc })
}

fn remap_method_ref<R: Remapper + ?Sized>(remapper: &R, method_ref: MethodRef) -> Result<MethodRef> {
	let name = remapper.map_method_name(&method_ref.class, &method_ref.name, &method_ref.desc)?;
	let desc = remapper.map_method_desc(&method_ref.desc)?;
	let class = remapper.map(&method_ref.class)?;
	Ok(MethodRef { class, name, desc })
}

fn remap_handle<R: Remapper + ?Sized>(remapper: &R, handle: Handle) -> Result<Handle> {
	Ok(match handle {
		Handle::GetField(f) => Handle::GetField(remap_field_ref(remapper, f)?),
		Handle::GetStatic(f) => Handle::GetStatic(remap_field_ref(remapper, f)?),
		Handle::PutField(f) => Handle::PutField(remap_field_ref(remapper, f)?),
		Handle::PutStatic(f) => Handle::PutStatic(remap_field_ref(remapper, f)?),
		Handle::InvokeVirtual(m) => Handle::InvokeVirtual(remap_method_ref(remapper, m)?),
		Handle::InvokeStatic(m, is_interface) => Handle::InvokeStatic(remap_method_ref(remapper, m)?, is_interface),
		Handle::InvokeSpecial(m, is_interface) => Handle::InvokeSpecial(remap_method_ref(remapper, m)?, is_interface),
		Handle::NewInvokeSpecial(m) => Handle::NewInvokeSpecial(remap_method_ref(remapper, m)?),
		Handle::InvokeInterface(m) => Handle::InvokeInterface(remap_method_ref(remapper, m)?),
	})
}

fn remap_loadable<R: Remapper + ?Sized>(remapper: &R, loadable: Loadable) -> Result<Loadable> {
	Ok(match loadable {
		Loadable::Class(name) => Loadable::Class(remapper.map(&name)?),
		Loadable::MethodHandle(handle) => Loadable::MethodHandle(remap_handle(remapper, handle)?),
		Loadable::MethodType(desc) => Loadable::MethodType(remapper.map_method_desc(&desc)?),
		Loadable::Dynamic(condy) => Loadable::Dynamic(remap_constant_dynamic(remapper, condy)?),
		other @ (Loadable::Integer(_) | Loadable::Float(_) | Loadable::Long(_) | Loadable::Double(_) | Loadable::String(_)) => other,
	})
}

/// A constant-dynamic's `name` is a bootstrap-method argument, not a reference into any class's
/// field or method table -- there's no owning class and no dedicated `Remapper` method for it
/// (unlike `invokedynamic`'s call-site name, which `map_invoke_dynamic_method_name` does cover),
/// so it's carried through unchanged.
fn remap_constant_dynamic<R: Remapper + ?Sized>(remapper: &R, condy: ConstantDynamic) -> Result<ConstantDynamic> {
	Ok(ConstantDynamic {
		name: condy.name,
		descriptor: remapper.map_desc(&condy.descriptor)?,
		handle: remap_handle(remapper, condy.handle)?,
		arguments: condy.arguments.into_iter().map(|a| remap_loadable(remapper, a)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_invoke_dynamic<R: Remapper + ?Sized>(remapper: &R, indy: InvokeDynamic) -> Result<InvokeDynamic> {
	Ok(InvokeDynamic {
		name: remapper.map_invoke_dynamic_method_name(&indy.name, &indy.descriptor)?,
		descriptor: remapper.map_method_desc(&indy.descriptor)?,
		handle: remap_handle(remapper, indy.handle)?,
		arguments: indy.arguments.into_iter().map(|a| remap_loadable(remapper, a)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_instruction<R: Remapper + ?Sized>(remapper: &R, instruction: Instruction) -> Result<Instruction> {
	Ok(match instruction {
		Instruction::Ldc(loadable) => Instruction::Ldc(remap_loadable(remapper, loadable)?),
		Instruction::GetStatic(f) => Instruction::GetStatic(remap_field_ref(remapper, f)?),
		Instruction::PutStatic(f) => Instruction::PutStatic(remap_field_ref(remapper, f)?),
		Instruction::GetField(f) => Instruction::GetField(remap_field_ref(remapper, f)?),
		Instruction::PutField(f) => Instruction::PutField(remap_field_ref(remapper, f)?),
		Instruction::InvokeVirtual(m) => Instruction::InvokeVirtual(remap_method_ref(remapper, m)?),
		Instruction::InvokeSpecial(m, is_interface) => Instruction::InvokeSpecial(remap_method_ref(remapper, m)?, is_interface),
		Instruction::InvokeStatic(m, is_interface) => Instruction::InvokeStatic(remap_method_ref(remapper, m)?, is_interface),
		Instruction::InvokeInterface(m) => Instruction::InvokeInterface(remap_method_ref(remapper, m)?),
		Instruction::InvokeDynamic(indy) => Instruction::InvokeDynamic(remap_invoke_dynamic(remapper, indy)?),
		Instruction::New(name) => Instruction::New(remapper.map(&name)?),
		Instruction::ANewArray(name) => Instruction::ANewArray(remapper.map(&name)?),
		Instruction::CheckCast(name) => Instruction::CheckCast(remapper.map(&name)?),
		Instruction::InstanceOf(name) => Instruction::InstanceOf(remapper.map(&name)?),
		Instruction::MultiANewArray(name, dimensions) => Instruction::MultiANewArray(remapper.map(&name)?, dimensions),
		other => other,
	})
}

fn remap_verification_type_info<R: Remapper + ?Sized>(remapper: &R, info: VerificationTypeInfo) -> Result<VerificationTypeInfo> {
	Ok(match info {
		VerificationTypeInfo::Object(name) => VerificationTypeInfo::Object(remapper.map(&name)?),
		other => other,
	})
}

fn remap_stack_map_data<R: Remapper + ?Sized>(remapper: &R, frame: StackMapData) -> Result<StackMapData> {
	Ok(match frame {
		StackMapData::Same => StackMapData::Same,
		StackMapData::SameLocals1StackItem { stack } => StackMapData::SameLocals1StackItem { stack: remap_verification_type_info(remapper, stack)? },
		StackMapData::Chop { k } => StackMapData::Chop { k },
		StackMapData::Append { locals } => StackMapData::Append {
			locals: locals.into_iter().map(|l| remap_verification_type_info(remapper, l)).collect::<Result<Vec<_>>>()?,
		},
		StackMapData::Full { locals, stack } => StackMapData::Full {
			locals: locals.into_iter().map(|l| remap_verification_type_info(remapper, l)).collect::<Result<Vec<_>>>()?,
			stack: stack.into_iter().map(|l| remap_verification_type_info(remapper, l)).collect::<Result<Vec<_>>>()?,
		},
	})
}

fn remap_instruction_list_entry<R: Remapper + ?Sized>(remapper: &R, entry: InstructionListEntry) -> Result<InstructionListEntry> {
	Ok(InstructionListEntry {
		label: entry.label,
		frame: entry.frame.map(|f| remap_stack_map_data(remapper, f)).transpose()?,
		instruction: remap_instruction(remapper, entry.instruction)?,
	})
}

fn remap_exception<R: Remapper + ?Sized>(remapper: &R, exception: Exception) -> Result<Exception> {
	Ok(Exception {
		start: exception.start,
		end: exception.end,
		handler: exception.handler,
		catch: exception.catch.map(|c| remapper.map(&c)).transpose()?,
	})
}

fn remap_lv<R: Remapper + ?Sized>(remapper: &R, lv: Lv) -> Result<Lv> {
	Ok(Lv {
		range: lv.range,
		name: remapper.map_local_variable_name(&lv.name)?,
		descriptor: lv.descriptor.map(|d| remapper.map_desc(&d)).transpose()?,
		signature: lv.signature.map(|s| remapper.map_field_signature(&s)).transpose()?,
		index: lv.index,
	})
}

/// Remaps every reference-carrying part of a method body: the instruction stream (including
/// stack-map frames attached to labels), the try/catch table and the local-variable table.
/// `runtime_*_type_annotations` carry no class-name data of their own ([`TargetInfoCode`](crate::tree::type_annotation::TargetInfoCode)
/// only references labels/indices), so only the nested [`Annotation`] needs remapping.
pub fn remap_code<R: Remapper + ?Sized>(remapper: &R, code: Code) -> Result<Code> {
	Ok(Code {
		max_stack: code.max_stack,
		max_locals: code.max_locals,
		instructions: code.instructions.into_iter().map(|e| remap_instruction_list_entry(remapper, e)).collect::<Result<Vec<_>>>()?,
		exception_table: code.exception_table.into_iter().map(|e| remap_exception(remapper, e)).collect::<Result<Vec<_>>>()?,
		last_label: code.last_label,
		line_numbers: code.line_numbers,
		local_variables: code.local_variables.map(|lvs| lvs.into_iter().map(|lv| remap_lv(remapper, lv)).collect::<Result<Vec<_>>>()).transpose()?,
		runtime_visible_type_annotations: code.runtime_visible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_type_annotations: code.runtime_invisible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		attributes: code.attributes,
	})
}

fn remap_annotation<R: Remapper + ?Sized>(remapper: &R, annotation: Annotation) -> Result<Annotation> {
	Ok(Annotation {
		annotation_type: remapper.map_desc(&annotation.annotation_type)?,
		element_value_pairs: annotation.element_value_pairs.into_iter().map(|p| remap_element_value_pair(remapper, p)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_element_value_pair<R: Remapper + ?Sized>(remapper: &R, pair: ElementValuePair) -> Result<ElementValuePair> {
	Ok(ElementValuePair {
		name: remapper.map_annotation_attribute_name(&pair.name)?,
		value: remap_element_value(remapper, pair.value)?,
	})
}

fn remap_element_value<R: Remapper + ?Sized>(remapper: &R, value: ElementValue) -> Result<ElementValue> {
	Ok(match value {
		ElementValue::Object(o) => ElementValue::Object(o),
		ElementValue::Enum { type_name, const_name } => ElementValue::Enum {
			type_name: remapper.map_desc(&type_name)?,
			const_name,
		},
		ElementValue::Class(return_desc) => ElementValue::Class(remapper.map_return_desc(&return_desc)?),
		ElementValue::AnnotationInterface(a) => ElementValue::AnnotationInterface(remap_annotation(remapper, a)?),
		ElementValue::ArrayType(values) => ElementValue::ArrayType(values.into_iter().map(|v| remap_element_value(remapper, v)).collect::<Result<Vec<_>>>()?),
	})
}

/// Remaps the [`Annotation`] carried by a type annotation. The `type_reference`/`type_path` parts
/// (which say *where* on a type the annotation sits -- a type parameter index, an array nesting
/// depth, a label) never hold a class or member name, so they pass through unchanged.
fn remap_type_annotation<R: Remapper + ?Sized, T>(remapper: &R, annotation: TypeAnnotation<T>) -> Result<TypeAnnotation<T>> {
	Ok(TypeAnnotation {
		type_reference: annotation.type_reference,
		type_path: annotation.type_path,
		annotation: remap_annotation(remapper, annotation.annotation)?,
	})
}

fn remap_inner_class<R: Remapper + ?Sized>(remapper: &R, inner_class: InnerClass) -> Result<InnerClass> {
	Ok(InnerClass {
		inner_class: remapper.map(&inner_class.inner_class)?,
		outer_class: inner_class.outer_class.map(|c| remapper.map(&c)).transpose()?,
		// The simple nested-class name isn't independently addressable (it's only meaningful
		// relative to the already-remapped `inner_class`/`outer_class` pair), so it's carried
		// through unchanged rather than routed through a dedicated remap method.
		inner_name: inner_class.inner_name,
		flags: inner_class.flags,
	})
}

fn remap_enclosing_method<R: Remapper + ?Sized>(remapper: &R, enclosing_method: EnclosingMethod) -> Result<EnclosingMethod> {
	let method = enclosing_method.method.map(|m| -> Result<_> {
		let name = remapper.map_method_name(&enclosing_method.class, &m.name, &m.desc)?;
		let desc = remapper.map_method_desc(&m.desc)?;
		Ok(MethodNameAndDesc { name, desc })
	}).transpose()?;
	Ok(EnclosingMethod {
		class: remapper.map(&enclosing_method.class)?,
		method,
	})
}

fn remap_record_component<R: Remapper + ?Sized>(remapper: &R, owner: &ClassName, component: RecordComponent) -> Result<RecordComponent> {
	Ok(RecordComponent {
		name: remapper.map_record_component_name(owner, &component.name, &component.descriptor)?,
		descriptor: remapper.map_desc(&component.descriptor)?,
		signature: component.signature.map(|s| remapper.map_field_signature(&s)).transpose()?,
		runtime_visible_annotations: component.runtime_visible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_annotations: component.runtime_invisible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_visible_type_annotations: component.runtime_visible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_type_annotations: component.runtime_invisible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		attributes: component.attributes,
	})
}

fn remap_module_requires<R: Remapper + ?Sized>(remapper: &R, requires: ModuleRequires) -> Result<ModuleRequires> {
	Ok(ModuleRequires {
		name: remapper.map_module_name(&requires.name)?,
		flags: requires.flags,
		version: requires.version,
	})
}

fn remap_module_exports<R: Remapper + ?Sized>(remapper: &R, exports: ModuleExports) -> Result<ModuleExports> {
	Ok(ModuleExports {
		name: remapper.map_package_name(&exports.name)?,
		flags: exports.flags,
		exports_to: exports.exports_to.into_iter().map(|m| remapper.map_module_name(&m)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_module_opens<R: Remapper + ?Sized>(remapper: &R, opens: ModuleOpens) -> Result<ModuleOpens> {
	Ok(ModuleOpens {
		name: remapper.map_package_name(&opens.name)?,
		flags: opens.flags,
		opens_to: opens.opens_to.into_iter().map(|m| remapper.map_module_name(&m)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_module_provides<R: Remapper + ?Sized>(remapper: &R, provides: ModuleProvides) -> Result<ModuleProvides> {
	Ok(ModuleProvides {
		name: remapper.map(&provides.name)?,
		provides_with: provides.provides_with.into_iter().map(|c| remapper.map(&c)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_module<R: Remapper + ?Sized>(remapper: &R, module: Module) -> Result<Module> {
	Ok(Module {
		name: remapper.map_module_name(&module.name)?,
		flags: module.flags,
		version: module.version,
		requires: module.requires.into_iter().map(|r| remap_module_requires(remapper, r)).collect::<Result<Vec<_>>>()?,
		exports: module.exports.into_iter().map(|e| remap_module_exports(remapper, e)).collect::<Result<Vec<_>>>()?,
		opens: module.opens.into_iter().map(|o| remap_module_opens(remapper, o)).collect::<Result<Vec<_>>>()?,
		uses: module.uses.into_iter().map(|c| remapper.map(&c)).collect::<Result<Vec<_>>>()?,
		provides: module.provides.into_iter().map(|p| remap_module_provides(remapper, p)).collect::<Result<Vec<_>>>()?,
	})
}

fn remap_method_parameter(parameter: MethodParameter) -> MethodParameter {
	// No dedicated `Remapper` method covers parameter names (they're debug-only, and unlike local
	// variable names they don't appear inside `Code`): carried through unchanged.
	parameter
}

fn remap_field<R: Remapper + ?Sized>(remapper: &R, owner: &ClassName, field: Field) -> Result<Field> {
	Ok(Field {
		access: field.access,
		name: remapper.map_field_name(owner, &field.name, &field.descriptor)?,
		descriptor: remapper.map_desc(&field.descriptor)?,

		has_deprecated_attribute: field.has_deprecated_attribute,
		has_synthetic_attribute: field.has_synthetic_attribute,

		constant_value: field.constant_value,
		signature: field.signature.map(|s| remapper.map_field_signature(&s)).transpose()?,

		runtime_visible_annotations: field.runtime_visible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_annotations: field.runtime_invisible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_visible_type_annotations: field.runtime_visible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_type_annotations: field.runtime_invisible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,

		attributes: field.attributes,
	})
}

fn remap_method<R: Remapper + ?Sized>(remapper: &R, owner: &ClassName, method: Method) -> Result<Method> {
	Ok(Method {
		access: method.access,
		name: remapper.map_method_name(owner, &method.name, &method.descriptor)?,
		descriptor: remapper.map_method_desc(&method.descriptor)?,

		has_deprecated_attribute: method.has_deprecated_attribute,
		has_synthetic_attribute: method.has_synthetic_attribute,

		code: method.code.map(|c| remap_code(remapper, c)).transpose()?,
		exceptions: method.exceptions.map(|es| es.into_iter().map(|e| remapper.map(&e)).collect::<Result<Vec<_>>>()).transpose()?,
		signature: method.signature.map(|s| remapper.map_method_signature(&s)).transpose()?,

		runtime_visible_annotations: method.runtime_visible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_annotations: method.runtime_invisible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_visible_type_annotations: method.runtime_visible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_type_annotations: method.runtime_invisible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,

		annotation_default: method.annotation_default.map(|v| remap_element_value(remapper, v)).transpose()?,
		method_parameters: method.method_parameters.map(|ps| ps.into_iter().map(remap_method_parameter).collect()),

		attributes: method.attributes,
	})
}

/// Remaps an entire class file: its own name, superclass, interfaces, fields, methods, and every
/// nested attribute that can reference a class, field, method, package or module name.
pub fn remap_class_file<R: Remapper + ?Sized>(remapper: &R, class_file: ClassFile) -> Result<ClassFile> {
	let owner = class_file.name.clone();

	Ok(ClassFile {
		version: class_file.version,
		access: class_file.access,
		name: remapper.map(&owner)?,
		super_class: class_file.super_class.map(|c| remapper.map(&c)).transpose()?,
		interfaces: class_file.interfaces.into_iter().map(|c| remapper.map(&c)).collect::<Result<Vec<_>>>()?,

		fields: class_file.fields.into_iter().map(|f| remap_field(remapper, &owner, f)).collect::<Result<Vec<_>>>()?,
		methods: class_file.methods.into_iter().map(|m| remap_method(remapper, &owner, m)).collect::<Result<Vec<_>>>()?,

		has_deprecated_attribute: class_file.has_deprecated_attribute,
		has_synthetic_attribute: class_file.has_synthetic_attribute,

		inner_classes: class_file.inner_classes.map(|ics| ics.into_iter().map(|ic| remap_inner_class(remapper, ic)).collect::<Result<Vec<_>>>()).transpose()?,
		enclosing_method: class_file.enclosing_method.map(|em| remap_enclosing_method(remapper, em)).transpose()?,
		signature: class_file.signature.map(|s| remapper.map_class_signature(&s)).transpose()?,

		source_file: class_file.source_file,
		source_debug_extension: class_file.source_debug_extension,

		runtime_visible_annotations: class_file.runtime_visible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_annotations: class_file.runtime_invisible_annotations.into_iter().map(|a| remap_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_visible_type_annotations: class_file.runtime_visible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,
		runtime_invisible_type_annotations: class_file.runtime_invisible_type_annotations.into_iter().map(|a| remap_type_annotation(remapper, a)).collect::<Result<Vec<_>>>()?,

		module: class_file.module.map(|m| remap_module(remapper, m)).transpose()?,
		module_packages: class_file.module_packages.map(|ps| ps.into_iter().map(|p| remapper.map_package_name(&p)).collect::<Result<Vec<_>>>()).transpose()?,
		module_main_class: class_file.module_main_class.map(|c| remapper.map(&c)).transpose()?,

		nest_host_class: class_file.nest_host_class.map(|c| remapper.map(&c)).transpose()?,
		nest_members: class_file.nest_members.map(|cs| cs.into_iter().map(|c| remapper.map(&c)).collect::<Result<Vec<_>>>()).transpose()?,
		permitted_subclasses: class_file.permitted_subclasses.map(|cs| cs.into_iter().map(|c| remapper.map(&c)).collect::<Result<Vec<_>>>()).transpose()?,

		record_components: class_file.record_components.into_iter().map(|rc| remap_record_component(remapper, &owner, rc)).collect::<Result<Vec<_>>>()?,

		attributes: class_file.attributes,
	})
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use std::collections::HashMap;
	use crate::tree::class::{ClassAccess, ClassFile, ClassName, ClassNameSlice, Version};
	use crate::tree::field::{Field, FieldAccess, FieldDescriptor, FieldName};
	use crate::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName, MethodRef};
	use crate::tree::method::code::{Code, Instruction, InstructionListEntry};
	use super::{remap_class_file, remap_method_ref, Remapper};

	/// A toy remapper driven by a literal rename table, for testing -- everything not in the
	/// table is left alone.
	struct MapRemapper(HashMap<String, String>);

	impl Remapper for MapRemapper {
		fn map(&self, internal_name: &ClassNameSlice) -> anyhow::Result<ClassName> {
			Ok(match self.0.get(internal_name.as_inner().as_str()) {
				Some(renamed) => ClassName::from(renamed.as_str()),
				None => internal_name.to_owned(),
			})
		}
	}

	fn class_access() -> ClassAccess {
		ClassAccess {
			is_public: true, is_final: false, is_super: true, is_interface: false, is_abstract: false,
			is_synthetic: false, is_annotation: false, is_enum: false, is_module: false,
		}
	}

	fn method_access() -> MethodAccess {
		MethodAccess {
			is_public: true, is_private: false, is_protected: false, is_static: true,
			is_final: false, is_synchronized: false, is_bridge: false, is_varargs: false,
			is_native: false, is_abstract: false, is_strict: false, is_synthetic: false,
		}
	}

	#[test]
	fn unmapped_class_name_passes_through_unchanged() {
		let remapper = MapRemapper(HashMap::new());
		let class_name = ClassName::from("com/example/Foo");
		assert_eq!(remapper.map(&class_name).unwrap(), class_name);
	}

	#[test]
	fn method_ref_class_and_descriptor_are_both_remapped() {
		let mut table = HashMap::new();
		table.insert("com/example/Old".to_owned(), "com/example/New".to_owned());
		let remapper = MapRemapper(table);

		let method_ref = MethodRef {
			class: ClassName::from("com/example/Old"),
			name: MethodName::new("frobnicate").unwrap(),
			desc: MethodDescriptor::from("(Lcom/example/Old;)Lcom/example/Old;"),
		};

		let remapped = remap_method_ref(&remapper, method_ref).unwrap();
		assert_eq!(remapped.class, ClassName::from("com/example/New"));
		assert_eq!(remapped.desc, MethodDescriptor::from("(Lcom/example/New;)Lcom/example/New;"));
	}

	#[test]
	fn class_file_renames_itself_its_super_class_and_its_members_invoke_calls() {
		let mut table = HashMap::new();
		table.insert("com/example/Old".to_owned(), "com/example/New".to_owned());
		table.insert("java/lang/Object".to_owned(), "java/lang/Object".to_owned());
		let remapper = MapRemapper(table);

		let class_file = ClassFile {
			version: Version { major: 61, minor: 0 },
			access: class_access(),
			name: ClassName::from("com/example/Old"),
			super_class: Some(ClassName::from("java/lang/Object")),
			interfaces: vec![],
			fields: vec![Field {
				access: FieldAccess {
					is_public: true, is_private: false, is_protected: false, is_static: false,
					is_final: false, is_volatile: false, is_transient: false, is_synthetic: false, is_enum: false,
				},
				name: FieldName::new("self").unwrap(),
				descriptor: FieldDescriptor::from("Lcom/example/Old;"),
				has_deprecated_attribute: false,
				has_synthetic_attribute: false,
				constant_value: None,
				signature: None,
				runtime_visible_annotations: vec![],
				runtime_invisible_annotations: vec![],
				runtime_visible_type_annotations: vec![],
				runtime_invisible_type_annotations: vec![],
				attributes: vec![],
			}],
			methods: vec![Method {
				access: method_access(),
				name: MethodName::new("make").unwrap(),
				descriptor: MethodDescriptor::from("()Lcom/example/Old;"),
				has_deprecated_attribute: false,
				has_synthetic_attribute: false,
				code: Some(Code {
					max_stack: Some(1),
					max_locals: Some(0),
					instructions: vec![
						InstructionListEntry { label: None, frame: None, instruction: Instruction::New(ClassName::from("com/example/Old")) },
						InstructionListEntry { label: None, frame: None, instruction: Instruction::AReturn },
					],
					exception_table: vec![],
					last_label: None,
					line_numbers: None,
					local_variables: None,
					runtime_visible_type_annotations: vec![],
					runtime_invisible_type_annotations: vec![],
					attributes: vec![],
				}),
				exceptions: None,
				signature: None,
				runtime_visible_annotations: vec![],
				runtime_invisible_annotations: vec![],
				runtime_visible_type_annotations: vec![],
				runtime_invisible_type_annotations: vec![],
				annotation_default: None,
				method_parameters: None,
				attributes: vec![],
			}],
			has_deprecated_attribute: false,
			has_synthetic_attribute: false,
			inner_classes: None,
			enclosing_method: None,
			signature: None,
			source_file: None,
			source_debug_extension: None,
			runtime_visible_annotations: vec![],
			runtime_invisible_annotations: vec![],
			runtime_visible_type_annotations: vec![],
			runtime_invisible_type_annotations: vec![],
			module: None,
			module_packages: None,
			module_main_class: None,
			nest_host_class: None,
			nest_members: None,
			permitted_subclasses: None,
			record_components: vec![],
			attributes: vec![],
		};

		let remapped = remap_class_file(&remapper, class_file).unwrap();
		assert_eq!(remapped.name, ClassName::from("com/example/New"));
		assert_eq!(remapped.super_class, Some(ClassName::from("java/lang/Object")));
		assert_eq!(remapped.fields[0].descriptor, FieldDescriptor::from("Lcom/example/New;"));
		assert_eq!(remapped.methods[0].descriptor, MethodDescriptor::from("()Lcom/example/New;"));

		let code = remapped.methods[0].code.as_ref().unwrap();
		assert!(matches!(&code.instructions[0].instruction, Instruction::New(name) if *name == ClassName::from("com/example/New")));
	}
}
