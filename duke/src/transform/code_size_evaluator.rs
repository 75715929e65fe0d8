//! Estimates the `[min, max]` possible encoded byte size of a method's code array without
//! resolving branch offsets or constant pool indices, each of which can independently widen an
//! instruction's encoding.
//!
//! The writer (see [`crate::simple_class_writer`]'s `if_helper`/`goto_helper`/`switch_helper`)
//! resolves that uncertainty to a fixpoint by iterating until offsets stop growing. This
//! evaluator skips that iteration and instead reports the range a caller needs to stay under -
//! useful for inlining heuristics or size-limit checks that don't want to run the writer just to
//! ask "how big could this get".

use crate::tree::method::code::{Code, Instruction, LvIndex};

/// An inclusive `[min, max]` byte size range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SizeRange {
	pub min: u32,
	pub max: u32,
}

impl SizeRange {
	const fn fixed(size: u32) -> SizeRange {
		SizeRange { min: size, max: size }
	}

	fn add_assign(&mut self, other: SizeRange) {
		self.min += other.min;
		self.max += other.max;
	}
}

/// Size of a local-variable-slot-indexed instruction whose narrow (non-`_n`) form is
/// `opcode + u8 index`: slots `0..=3` get a dedicated one-byte `_n` opcode, slots up to `255` use
/// the two-byte form, and anything wider needs the three-byte `wide` prefix.
fn indexed_instruction_size(index: &LvIndex) -> SizeRange {
	if index.index < 4 {
		SizeRange::fixed(1)
	} else if index.index <= 0xff {
		SizeRange::fixed(2)
	} else {
		SizeRange::fixed(4) // wide prefix + opcode + u16 index
	}
}

fn jump_offset_size(is_unconditional: bool) -> SizeRange {
	if is_unconditional {
		// goto/jsr: 3 bytes, or 5 if the offset needs the `_w` variant
		SizeRange { min: 3, max: 5 }
	} else {
		// conditional branches have no `_w` form; an out-of-range offset is worked around by
		// negating the condition and jumping over a `goto_w` (3 + 5 = 8 bytes worst case)
		SizeRange { min: 3, max: 8 }
	}
}

fn switch_size(fixed_payload: u32) -> SizeRange {
	// opcode + 0..3 padding bytes to the next 4-byte boundary + the fixed payload
	SizeRange { min: 1 + fixed_payload, max: 4 + fixed_payload }
}

fn instruction_size(instruction: &Instruction) -> SizeRange {
	use Instruction::*;
	match instruction {
		BiPush(_) => SizeRange::fixed(2),
		SiPush(_) => SizeRange::fixed(3),

		Ldc(loadable) => match loadable {
			crate::tree::method::code::Loadable::Long(_) | crate::tree::method::code::Loadable::Double(_) =>
				SizeRange::fixed(3), // ldc2_w always
			_ => SizeRange { min: 2, max: 3 }, // ldc vs ldc_w, depending on the pool index
		},

		ILoad(i) | LLoad(i) | FLoad(i) | DLoad(i) | ALoad(i) => indexed_instruction_size(i),
		IStore(i) | LStore(i) | FStore(i) | DStore(i) | AStore(i) => indexed_instruction_size(i),
		IInc(i, _) => {
			// iinc has no `_n` compact form; narrow is opcode + u8 index + i8 amount, wide uses
			// the `wide` prefix with a u16 index and i16 amount
			if i.index <= 0xff { SizeRange::fixed(3) } else { SizeRange::fixed(6) }
		},
		Ret(i) => if i.index <= 0xff { SizeRange::fixed(2) } else { SizeRange::fixed(4) },

		IfEq(_) | IfNe(_) | IfLt(_) | IfGe(_) | IfGt(_) | IfLe(_) |
		IfICmpEq(_) | IfICmpNe(_) | IfICmpLt(_) | IfICmpGe(_) | IfICmpGt(_) | IfICmpLe(_) |
		IfACmpEq(_) | IfACmpNe(_) | IfNull(_) | IfNonNull(_) => jump_offset_size(false),
		Goto(_) | Jsr(_) => jump_offset_size(true),

		TableSwitch { low, high, .. } => {
			let entries = (*high as i64 - *low as i64 + 1).max(0) as u32;
			switch_size(4 + 4 + 4 + 4 * entries)
		},
		LookupSwitch { pairs, .. } => switch_size(4 + 4 + 8 * pairs.len() as u32),

		GetStatic(_) | PutStatic(_) | GetField(_) | PutField(_) => SizeRange::fixed(3),
		InvokeVirtual(_) | InvokeSpecial(_, _) | InvokeStatic(_, _) => SizeRange::fixed(3),
		InvokeInterface(_) => SizeRange::fixed(5),
		InvokeDynamic(_) => SizeRange::fixed(5),

		New(_) | ANewArray(_) | CheckCast(_) | InstanceOf(_) => SizeRange::fixed(3),
		NewArray(_) => SizeRange::fixed(2),
		MultiANewArray(_, _) => SizeRange::fixed(4),

		_ => SizeRange::fixed(1),
	}
}

/// Computes the `[min, max]` byte size of `code`'s instruction stream. Ignores the six-byte
/// fixed header (`max_stack`, `max_locals`, `code_length`) and the exception table / attributes
/// that follow it, as those don't depend on layout in the way the instruction stream does.
pub fn evaluate_code_size(code: &Code) -> SizeRange {
	let mut total = SizeRange::default();
	for entry in &code.instructions {
		total.add_assign(instruction_size(&entry.instruction));
	}
	total
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::tree::method::code::{Code, Instruction, InstructionListEntry, LvIndex};
	use super::evaluate_code_size;

	fn code(instructions: Vec<Instruction>) -> Code {
		Code {
			instructions: instructions.into_iter().map(|instruction| InstructionListEntry { label: None, frame: None, instruction }).collect(),
			..Code::default()
		}
	}

	#[test]
	fn fixed_size_instructions_have_no_range() {
		let size = evaluate_code_size(&code(vec![Instruction::Nop, Instruction::Return]));
		assert_eq!(size.min, 2);
		assert_eq!(size.max, 2);
	}

	#[test]
	fn compact_load_form_for_low_slots() {
		let size = evaluate_code_size(&code(vec![Instruction::ILoad(LvIndex { index: 2 })]));
		assert_eq!(size, super::SizeRange::fixed(1));
	}

	#[test]
	fn wide_load_form_for_high_slots() {
		let size = evaluate_code_size(&code(vec![Instruction::ILoad(LvIndex { index: 300 })]));
		assert_eq!(size, super::SizeRange::fixed(4));
	}

	#[test]
	fn conditional_branch_has_a_range() {
		let size = evaluate_code_size(&code(vec![Instruction::IfEq(crate::tree::method::code::Label { id: 0 })]));
		assert_eq!(size.min, 3);
		assert_eq!(size.max, 8);
	}
}
