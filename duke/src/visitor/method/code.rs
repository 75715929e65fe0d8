use anyhow::Result;
use crate::tree::class::ClassName;
use crate::tree::method::code::{Exception, Label, Lv};
use crate::tree::type_annotation::TargetInfoCode;
use crate::visitor::annotation::TypeAnnotationsVisitor;
use crate::visitor::attribute::UnknownAttributeVisitor;
use crate::tree::method::code::Instruction;

pub trait CodeVisitor
where
	Self: Sized,
	Self::TypeAnnotationsVisitor: TypeAnnotationsVisitor<TargetInfoCode>,
	Self::UnknownAttribute: UnknownAttributeVisitor,
{
	type TypeAnnotationsVisitor;
	type TypeAnnotationsResidual;
	type UnknownAttribute;

	fn interests(&self) -> CodeInterests;

	fn visit_max_stack_and_max_locals(&mut self, max_stack: u16, max_locals: u16) -> Result<()>;

	fn visit_instruction(&mut self, label: Option<Label>, frame: Option<StackMapData>, instruction: Instruction) -> Result<()>;

	fn visit_exception_table(&mut self, exception_table: Vec<Exception>) -> Result<()>;
	fn visit_last_label(&mut self, last_label: Label) -> Result<()>;

	fn visit_line_numbers(&mut self, line_numbers: Vec<(Label, u16)>) -> Result<()>;
	fn visit_local_variables(&mut self, local_variables: Vec<Lv>) -> Result<()>;

	fn visit_type_annotations(self, visible: bool) -> Result<(Self::TypeAnnotationsResidual, Self::TypeAnnotationsVisitor)>;
	fn finish_type_annotations(this: Self::TypeAnnotationsResidual, type_annotations_visitor: Self::TypeAnnotationsVisitor) -> Result<Self>;

	fn visit_unknown_attribute(&mut self, unknown_attribute: Self::UnknownAttribute) -> Result<()>;
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct CodeInterests {
	pub stack_map_table: bool,

	pub line_number_table: bool,
	pub local_variable_table: bool,
	pub local_variable_type_table: bool,

	pub runtime_visible_type_annotations: bool,
	pub runtime_invisible_type_annotations: bool,

	pub unknown_attributes: bool,
}

impl CodeInterests {
	pub fn none() -> CodeInterests {
		Self::default()
	}
	pub fn all() -> CodeInterests {
		CodeInterests {
			stack_map_table: true,

			line_number_table: true,
			local_variable_table: true,
			local_variable_type_table: true,

			runtime_visible_type_annotations: true,
			runtime_invisible_type_annotations: true,

			unknown_attributes: true,
		}
	}
}

/// A single stack map frame, in the uncompressed form that's easiest to work with in memory.
///
/// Corresponds to the `StackMapTable` entries of JVMS 4.7.4, already resolved to absolute
/// locals/stack contents rather than the wire encoding's deltas against the previous frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StackMapData {
	/// Same locals, empty stack. Covers `SAME` and `SAME_FRAME_EXTENDED`.
	Same,
	/// Same locals, one item on the stack. Covers `SAME_LOCALS_1_STACK_ITEM` and its extended form.
	SameLocals1StackItem {
		stack: VerificationTypeInfo,
	},
	/// `k` last locals of the previous frame are absent, empty stack.
	Chop {
		k: u8,
	},
	/// Previous frame's locals, plus these appended, empty stack.
	Append {
		locals: Vec<VerificationTypeInfo>,
	},
	/// Full list of locals and stack, independent of the previous frame.
	Full {
		locals: Vec<VerificationTypeInfo>,
		stack: Vec<VerificationTypeInfo>,
	},
}

/// JVMS 4.7.4 `verification_type_info`.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationTypeInfo {
	Top,
	Integer,
	Float,
	Double,
	Long,
	Null,
	UninitializedThis,
	Object(ClassName),
	/// References the label of the `new` instruction that created the object.
	Uninitialized(Label),
}
