//! Folds several `<clinit>` methods contributed to the same class into one.
//!
//! A class file may only carry a single `<clinit>`. When multiple fragments (produced by
//! separate transformers, or merged together from several sources targeting the same class) each
//! contribute their own static initializer, the extras need to be renamed out of the way and
//! called from the one `<clinit>` that survives.

use anyhow::{Context, Result};
use crate::tree::class::ClassName;
use crate::tree::method::code::{Instruction, InstructionListEntry};
use crate::tree::method::{Method, MethodDescriptor, MethodName, MethodRef};

/// Renames every `<clinit>` in `methods` but the first to `{prefix}${n}` (`n` starting at `1`,
/// in encounter order), marks the renamed methods private and synthetic, and prepends an
/// `invokestatic` call to each of them (in order) to the front of the body of the surviving
/// `<clinit>`.
///
/// Does nothing if `methods` contains zero or one `<clinit>`.
pub fn merge_static_initializers(owner: &ClassName, methods: &mut [Method], prefix: &str) -> Result<()> {
	let clinit_indices: Vec<usize> = methods.iter()
		.enumerate()
		.filter(|(_, m)| m.name.as_slice() == MethodName::CLINIT)
		.map(|(i, _)| i)
		.collect();

	if clinit_indices.len() <= 1 {
		return Ok(());
	}

	let void_descriptor = MethodDescriptor::from("()V");

	let mut calls = Vec::with_capacity(clinit_indices.len() - 1);
	for (n, &index) in clinit_indices.iter().enumerate().skip(1) {
		let method = &mut methods[index];
		method.name = MethodName::new(format!("{prefix}${n}"))
			.with_context(|| anyhow::anyhow!("invalid synthetic static initializer name `{prefix}${n}`"))?;
		method.access.is_private = true;
		method.access.is_synthetic = true;
		method.descriptor = void_descriptor.clone();

		calls.push(MethodRef {
			class: owner.clone(),
			name: method.name.clone(),
			desc: void_descriptor.clone(),
		});
	}

	let primary = &mut methods[clinit_indices[0]];
	let code = primary.code.as_mut()
		.context("<clinit> has no Code attribute, can't prepend merged static initializer calls")?;

	let prelude = calls.into_iter().map(|call| InstructionListEntry {
		label: None,
		frame: None,
		instruction: Instruction::InvokeStatic(call, false),
	});
	code.instructions.splice(0..0, prelude);

	// The merged calls don't change the stack depth the body needs (invokestatic on a `()V`
	// method is stack-neutral); clear the cached bounds so the writer recomputes them rather
	// than risk silently keeping a value that was only valid for the unmerged body.
	code.max_stack = None;
	code.max_locals = None;

	Ok(())
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::tree::class::ClassName;
	use crate::tree::method::code::{Code, Instruction, InstructionListEntry};
	use crate::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName};
	use super::merge_static_initializers;

	fn access() -> MethodAccess {
		MethodAccess {
			is_public: false, is_private: false, is_protected: false, is_static: true,
			is_final: false, is_synchronized: false, is_bridge: false, is_varargs: false,
			is_native: false, is_abstract: false, is_strict: false, is_synthetic: false,
		}
	}

	fn clinit(body: Vec<Instruction>) -> Method {
		Method {
			access: access(),
			name: MethodName::CLINIT.to_owned(),
			descriptor: MethodDescriptor::from("()V"),
			has_deprecated_attribute: false,
			has_synthetic_attribute: false,
			code: Some(Code {
				max_stack: Some(0),
				max_locals: Some(0),
				instructions: body.into_iter().map(|instruction| InstructionListEntry { label: None, frame: None, instruction }).collect(),
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
		}
	}

	#[test]
	fn single_clinit_is_untouched() {
		let mut methods = vec![clinit(vec![Instruction::Return])];
		merge_static_initializers(&ClassName::from("Foo"), &mut methods, "clinit").unwrap();
		assert_eq!(methods.len(), 1);
		assert_eq!(methods[0].name, MethodName::CLINIT.to_owned());
	}

	#[test]
	fn multiple_clinits_are_merged_into_the_first() {
		let mut methods = vec![
			clinit(vec![Instruction::Return]),
			clinit(vec![Instruction::Return]),
			clinit(vec![Instruction::Return]),
		];
		merge_static_initializers(&ClassName::from("Foo"), &mut methods, "clinit").unwrap();

		assert_eq!(methods[0].name, MethodName::CLINIT.to_owned());
		assert_eq!(methods[1].name, MethodName::new("clinit$1").unwrap());
		assert!(methods[1].access.is_private);
		assert!(methods[1].access.is_synthetic);
		assert_eq!(methods[2].name, MethodName::new("clinit$2").unwrap());

		let instructions = &methods[0].code.as_ref().unwrap().instructions;
		assert_eq!(instructions.len(), 3);
		assert!(matches!(instructions[0].instruction, Instruction::InvokeStatic(_, false)));
		assert!(matches!(instructions[1].instruction, Instruction::InvokeStatic(_, false)));
		assert!(matches!(instructions[2].instruction, Instruction::Return));
	}
}
