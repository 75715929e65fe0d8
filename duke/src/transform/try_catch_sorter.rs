//! Reorders a method's exception table so that handlers covering a shorter range of code come
//! before handlers covering a longer, encompassing one.
//!
//! The JVM verifier picks the *first* exception table entry whose range covers the throwing
//! instruction, regardless of how specific it is. Bytecode transformers that splice, duplicate or
//! reorder instructions (the [JSR inliner](crate::transform::jsr_inliner), for instance) can end
//! up emitting a broad `try` range before a narrower one nested inside it; sorting by range length
//! restores the usual source-level "innermost handler wins" behavior.

use crate::tree::method::code::{Code, Exception, Label};

fn label_position(code: &Code, label: &Label) -> usize {
	if code.last_label.as_ref() == Some(label) {
		return code.instructions.len();
	}
	code.instructions.iter().position(|entry| entry.label.as_ref() == Some(label)).unwrap_or(0)
}

/// Sorts `code.exception_table` by covered range length, ascending, breaking ties by keeping the
/// original relative order (a stable sort on the original index).
pub fn sort_exception_table(code: &mut Code) {
	let exception_table = std::mem::take(&mut code.exception_table);

	let mut indexed: Vec<(usize, Exception)> = exception_table.into_iter().enumerate().collect();
	indexed.sort_by_key(|(original_index, exception)| {
		let start = label_position(code, &exception.start);
		let end = label_position(code, &exception.end);
		(end.saturating_sub(start), *original_index)
	});

	code.exception_table = indexed.into_iter().map(|(_, exception)| exception).collect();
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::tree::class::ClassName;
	use crate::tree::method::code::{Code, Exception, Instruction, InstructionListEntry, Label};
	use super::sort_exception_table;

	fn label(id: u16) -> Label {
		Label { id }
	}

	fn entry(label: Option<Label>, instruction: Instruction) -> InstructionListEntry {
		InstructionListEntry { label, frame: None, instruction }
	}

	#[test]
	fn narrower_range_sorts_before_wider_one() {
		// labels: 0 [outer try] 1 [inner try] 2 nop 3 [inner end/outer still open] 4 nop 5 [outer end]
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::Nop),
				entry(Some(label(1)), Instruction::Nop),
				entry(Some(label(2)), Instruction::Nop),
				entry(Some(label(3)), Instruction::Nop),
				entry(Some(label(4)), Instruction::Nop),
			],
			last_label: Some(label(5)),
			exception_table: vec![
				Exception { start: label(0), end: label(5), handler: label(4), catch: Some(ClassName::from("java/lang/Exception")) },
				Exception { start: label(1), end: label(3), handler: label(4), catch: Some(ClassName::from("java/lang/RuntimeException")) },
			],
			..Code::default()
		};

		sort_exception_table(&mut code);

		assert_eq!(code.exception_table[0].start, label(1));
		assert_eq!(code.exception_table[1].start, label(0));
	}

	#[test]
	fn equal_length_ranges_keep_relative_order() {
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::Nop),
				entry(Some(label(1)), Instruction::Nop),
			],
			last_label: Some(label(2)),
			exception_table: vec![
				Exception { start: label(0), end: label(2), handler: label(1), catch: None },
				Exception { start: label(0), end: label(2), handler: label(1), catch: Some(ClassName::from("java/lang/Exception")) },
			],
			..Code::default()
		};

		sort_exception_table(&mut code);

		assert_eq!(code.exception_table[0].catch, None);
		assert!(code.exception_table[1].catch.is_some());
	}
}
