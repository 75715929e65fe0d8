//! Renumbers local variable slots in a method body, keeping every reference (load/store/iinc
//! instructions, the local variable table, and stack map frames) consistent with the new numbering.

use std::collections::HashMap;
use anyhow::Result;
use crate::tree::method::code::{Code, Instruction, LvIndex};
use crate::tree::method::MethodAccess;
use crate::tree::descriptor::Type;
use crate::visitor::method::code::{StackMapData, VerificationTypeInfo};

/// Computes the index of the first local slot not occupied by an implicit `this` or a declared
/// parameter, i.e. the first slot a method body is free to allocate on its own.
fn first_local_slot(access: &MethodAccess, parameter_types: &[Type]) -> u16 {
	let mut slot = if access.is_static { 0 } else { 1 };
	for t in parameter_types {
		slot += match t {
			Type::J | Type::D => 2,
			_ => 1,
		};
	}
	slot
}

/// A sparse `old_slot -> new_slot` renumbering, built up by [`LocalVariableSorter::new`] and
/// [`LocalVariableSorter::new_local`], then applied to a [`Code`] with [`LocalVariableSorter::remap`].
pub struct LocalVariableSorter {
	mapping: HashMap<u16, u16>,
	next_new_slot: u16,
}

impl LocalVariableSorter {
	/// `parameter_types` must be the parsed argument types of the method's descriptor, in order.
	pub fn new(access: &MethodAccess, parameter_types: &[Type]) -> LocalVariableSorter {
		let first_free = first_local_slot(access, parameter_types);

		let mut mapping = HashMap::new();
		let mut slot = 0u16;
		if !access.is_static {
			mapping.insert(slot, slot);
			slot += 1;
		}
		for t in parameter_types {
			mapping.insert(slot, slot);
			if matches!(t, Type::J | Type::D) {
				slot += 2;
			} else {
				slot += 1;
			}
		}
		debug_assert_eq!(slot, first_free);

		LocalVariableSorter { mapping, next_new_slot: first_free }
	}

	/// Allocates a fresh, previously-unused slot of the given size (1 for most types, 2 for
	/// `long`/`double`), returning its new index. Doesn't correspond to any old slot.
	pub fn new_local(&mut self, wide: bool) -> u16 {
		let slot = self.next_new_slot;
		self.next_new_slot += if wide { 2 } else { 1 };
		slot
	}

	fn map_slot(&mut self, old: u16, wide: bool) -> u16 {
		if let Some(&new) = self.mapping.get(&old) {
			new
		} else {
			let new = self.new_local(wide);
			self.mapping.insert(old, new);
			new
		}
	}

	fn remap_lv_index(&mut self, index: LvIndex, wide: bool) -> LvIndex {
		LvIndex { index: self.map_slot(index.index, wide) }
	}

	/// Rewrites every local-variable-referencing instruction, local variable table entry, and
	/// `Append`/`Full` stack map frame local vector in `code` through this sorter's mapping.
	///
	/// Frames must already be in the uncompressed form (see [`StackMapData`]); compressed
	/// `SAME`/`CHOP`/`SAME_LOCALS_1_STACK_ITEM` frames carry no local-variable payload and are
	/// left untouched.
	pub fn remap(&mut self, mut code: Code) -> Result<Code> {
		for entry in &mut code.instructions {
			entry.instruction = match std::mem::replace(&mut entry.instruction, Instruction::Nop) {
				Instruction::ILoad(i) => Instruction::ILoad(self.remap_lv_index(i, false)),
				Instruction::LLoad(i) => Instruction::LLoad(self.remap_lv_index(i, true)),
				Instruction::FLoad(i) => Instruction::FLoad(self.remap_lv_index(i, false)),
				Instruction::DLoad(i) => Instruction::DLoad(self.remap_lv_index(i, true)),
				Instruction::ALoad(i) => Instruction::ALoad(self.remap_lv_index(i, false)),
				Instruction::IStore(i) => Instruction::IStore(self.remap_lv_index(i, false)),
				Instruction::LStore(i) => Instruction::LStore(self.remap_lv_index(i, true)),
				Instruction::FStore(i) => Instruction::FStore(self.remap_lv_index(i, false)),
				Instruction::DStore(i) => Instruction::DStore(self.remap_lv_index(i, true)),
				Instruction::AStore(i) => Instruction::AStore(self.remap_lv_index(i, false)),
				Instruction::IInc(i, amount) => Instruction::IInc(self.remap_lv_index(i, false), amount),
				Instruction::Ret(i) => Instruction::Ret(self.remap_lv_index(i, false)),
				other => other,
			};

			if let Some(frame) = &mut entry.frame {
				self.remap_frame(frame);
			}
		}

		if let Some(local_variables) = &mut code.local_variables {
			for lv in local_variables {
				let wide = matches!(lv.descriptor.as_ref().map(|d| d.as_inner().as_str()), Some("J") | Some("D"));
				lv.index = self.remap_lv_index(lv.index, wide);
			}
		}

		Ok(code)
	}

	/// Remaps the locals vector of `Append`/`Full` frames. `Same`/`SameLocals1StackItem`/`Chop`
	/// carry no locals of their own (they're deltas against the previous frame) and so need no
	/// remapping here; the writer reconstructs them against the already-remapped previous frame.
	fn remap_frame(&mut self, frame: &mut StackMapData) {
		match frame {
			StackMapData::Append { locals } => {
				*locals = self.remap_locals(locals);
			},
			StackMapData::Full { locals, .. } => {
				*locals = self.remap_locals(locals);
			},
			_ => {},
		}
	}

	/// Reconstructs a locals vector against the new slot numbering.
	///
	/// Walks `old_locals` keeping an `old_var` cursor (each entry consumes one slot, except
	/// `Long`/`Double`, which imply a second, unrepresented slot), remaps the slot each non-`Top`
	/// entry starts at through the sparse `old_slot -> new_slot` map, and places the entry at its
	/// new slot in a freshly built vector - padding any gap this opens up with `Top` and finally
	/// collapsing the trailing `Top` run, exactly as the writer expects an uncompressed locals
	/// vector to look.
	fn remap_locals(&mut self, old_locals: &[VerificationTypeInfo]) -> Vec<VerificationTypeInfo> {
		let mut new_locals: Vec<VerificationTypeInfo> = Vec::new();
		let mut old_var: u16 = 0;
		for info in old_locals {
			let wide = matches!(info, VerificationTypeInfo::Long | VerificationTypeInfo::Double);
			if !matches!(info, VerificationTypeInfo::Top) {
				let new_var = self.map_slot(old_var, wide) as usize;
				if new_locals.len() <= new_var {
					new_locals.resize(new_var + 1, VerificationTypeInfo::Top);
				}
				new_locals[new_var] = info.clone();
			}
			old_var += if wide { 2 } else { 1 };
		}
		while matches!(new_locals.last(), Some(VerificationTypeInfo::Top)) {
			new_locals.pop();
		}
		new_locals
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::tree::descriptor::Type;
	use crate::tree::method::MethodAccess;
	use super::LocalVariableSorter;

	fn access(is_static: bool) -> MethodAccess {
		MethodAccess {
			is_public: true, is_private: false, is_protected: false, is_static,
			is_final: false, is_synchronized: false, is_bridge: false, is_varargs: false,
			is_native: false, is_abstract: false, is_strict: false, is_synthetic: false,
		}
	}

	#[test]
	fn first_free_slot_instance_method() {
		let sorter = LocalVariableSorter::new(&access(false), &[Type::I, Type::J, Type::Object(crate::tree::class::ClassName::JAVA_LANG_OBJECT.to_owned())]);
		// this(1) + I(1) + J(2) + Object(1) = 5
		assert_eq!(sorter.next_new_slot, 5);
	}

	#[test]
	fn first_free_slot_static_method() {
		let sorter = LocalVariableSorter::new(&access(true), &[Type::D]);
		// D(2), no implicit this
		assert_eq!(sorter.next_new_slot, 2);
	}

	#[test]
	fn new_local_allocates_past_parameters() {
		let mut sorter = LocalVariableSorter::new(&access(true), &[Type::I]);
		let a = sorter.new_local(false);
		let b = sorter.new_local(true);
		assert_eq!(a, 1);
		assert_eq!(b, 2);
		assert_eq!(sorter.next_new_slot, 4);
	}

	#[test]
	fn remap_locals_reorders_and_collapses_trailing_top() {
		use crate::visitor::method::code::VerificationTypeInfo;

		// static void m(int a): `a` keeps its identity-mapped slot 0. A wide local inserted by the
		// transformer between frames takes new slots 1-2, pushing a later body-declared local
		// (old slot 1, not yet referenced by any instruction) out to new slot 3 on first sight.
		let mut sorter = LocalVariableSorter::new(&access(true), &[Type::I]);
		sorter.new_local(true);

		let old_locals = vec![VerificationTypeInfo::Integer, VerificationTypeInfo::Integer];
		let new_locals = sorter.remap_locals(&old_locals);

		// slot 0 is `a` (identity), slots 1-2 are reserved by the injected wide local and have no
		// frame entry of their own so they default to `Top`, slot 3 is the body local, remapped
		// from its old slot 1 on this first encounter.
		assert_eq!(new_locals, vec![
			VerificationTypeInfo::Integer,
			VerificationTypeInfo::Top,
			VerificationTypeInfo::Top,
			VerificationTypeInfo::Integer,
		]);
	}

	#[test]
	fn remap_locals_collapses_trailing_top_run() {
		use crate::visitor::method::code::VerificationTypeInfo;

		let mut sorter = LocalVariableSorter::new(&access(true), &[Type::I]);
		let old_locals = vec![VerificationTypeInfo::Integer];
		let new_locals = sorter.remap_locals(&old_locals);
		assert_eq!(new_locals, vec![VerificationTypeInfo::Integer]);
	}
}
