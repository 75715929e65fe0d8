//! Computes stack map frames for a method body by forward abstract interpretation, for callers
//! that hand the writer a [`Code`] with no frames of its own (see [`crate::simple_class_writer`]'s
//! `StackMapTable` encoder, which this module feeds).
//!
//! This does not replicate the JVM verifier's full subtype lattice: merging two different concrete
//! reference types produces `java/lang/Object` rather than their real common superclass, since
//! computing that would require a classpath to consult. This matches what "writing a valid class
//! file" requires without attempting to verify one (see the core's scope).

use std::collections::{HashMap, VecDeque};
use anyhow::{bail, Result};
use crate::tree::class::ClassName;
use crate::tree::descriptor::Type;
use crate::tree::method::code::{Code, Exception, Instruction, Label};
use crate::tree::method::{Method, MethodAccess};
use crate::visitor::method::code::VerificationTypeInfo;

/// The internal type lattice used while interpreting. Unlike [`VerificationTypeInfo`] (the wire
/// format), category-2 values (`long`/`double`) occupy two array slots here - a value slot
/// followed by a `Long2Top`/`Double2Top` placeholder - which makes stack/locals bookkeeping
/// uniform; [`to_verification_type_infos`] strips the placeholders back out before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicValue {
	Top,
	Integer,
	Float,
	Long,
	Double,
	Long2Top,
	Double2Top,
	Null,
	UninitializedThis,
	Object(ClassName),
	Uninitialized(Label),
}

impl BasicValue {
	fn size(&self) -> usize {
		match self {
			BasicValue::Long2Top | BasicValue::Double2Top => 0,
			_ => 1,
		}
	}

	fn of_type(t: &Type) -> BasicValue {
		match t {
			Type::B | Type::C | Type::I | Type::S | Type::Z => BasicValue::Integer,
			Type::F => BasicValue::Float,
			Type::J => BasicValue::Long,
			Type::D => BasicValue::Double,
			Type::Object(name) => BasicValue::Object(name.clone()),
			Type::Array(dim, array_type) => BasicValue::Object(array_class_name(*dim, array_type)),
		}
	}

	fn widen_slot(t: &Type) -> usize {
		match t {
			Type::J | Type::D => 2,
			_ => 1,
		}
	}

	/// Merges two values observed for the same slot along different control-flow paths.
	fn merge(&self, other: &BasicValue) -> BasicValue {
		if self == other {
			return self.clone();
		}
		match (self, other) {
			(BasicValue::Object(_), BasicValue::Object(_))
			| (BasicValue::Object(_), BasicValue::Null)
			| (BasicValue::Null, BasicValue::Object(_))
			| (BasicValue::Object(_), BasicValue::Uninitialized(_))
			| (BasicValue::Uninitialized(_), BasicValue::Object(_)) => {
				BasicValue::Object(ClassName::JAVA_LANG_OBJECT.to_owned())
			},
			(BasicValue::Null, BasicValue::Null) => BasicValue::Null,
			_ => BasicValue::Top,
		}
	}
}

fn array_class_name(dim: u8, array_type: &crate::tree::descriptor::ArrayType) -> ClassName {
	use crate::tree::descriptor::ArrayType as AT;
	let mut s = java_string::JavaString::new();
	for _ in 0..dim {
		s.push('[');
	}
	match array_type {
		AT::B => s.push('B'), AT::C => s.push('C'), AT::D => s.push('D'), AT::F => s.push('F'),
		AT::I => s.push('I'), AT::J => s.push('J'), AT::S => s.push('S'), AT::Z => s.push('Z'),
		AT::Object(name) => {
			s.push('L');
			s.push_java_str(name.as_inner());
			s.push(';');
		},
	}
	unsafe { ClassName::from_inner_unchecked(s) }
}

#[derive(Debug, Clone)]
struct Frame {
	locals: Vec<BasicValue>,
	stack: Vec<BasicValue>,
}

impl Frame {
	fn merge_into(&mut self, other: &Frame) -> bool {
		let mut changed = false;

		if self.locals.len() != other.locals.len() {
			let n = self.locals.len().min(other.locals.len());
			self.locals.truncate(n);
			changed = true;
		}
		for (i, slot) in self.locals.iter_mut().enumerate() {
			let merged = slot.merge(&other.locals[i]);
			if merged != *slot {
				*slot = merged;
				changed = true;
			}
		}

		debug_assert_eq!(self.stack.len(), other.stack.len(), "operand stack shape must match at merge points");
		for (i, slot) in self.stack.iter_mut().enumerate() {
			let merged = slot.merge(&other.stack[i]);
			if merged != *slot {
				*slot = merged;
				changed = true;
			}
		}

		changed
	}
}

fn push(stack: &mut Vec<BasicValue>, value: BasicValue) {
	let wide = matches!(value, BasicValue::Long | BasicValue::Double);
	stack.push(value);
	if wide {
		stack.push(if matches!(stack[stack.len() - 1], BasicValue::Long) { BasicValue::Long2Top } else { BasicValue::Double2Top });
	}
}

fn pop(stack: &mut Vec<BasicValue>) -> Result<BasicValue> {
	if let Some(top) = stack.pop() {
		if matches!(top, BasicValue::Long2Top | BasicValue::Double2Top) {
			stack.pop().ok_or_else(|| anyhow::anyhow!("stack underflow popping category-2 value"))
		} else {
			Ok(top)
		}
	} else {
		bail!("stack underflow")
	}
}

fn pop1(stack: &mut Vec<BasicValue>) -> Result<BasicValue> {
	stack.pop().ok_or_else(|| anyhow::anyhow!("stack underflow"))
}

/// Mints a [`Label`] that doesn't collide with any label already present in `code`, mirroring
/// [`crate::transform::jsr_inliner`]'s `LabelAllocator`.
fn next_free_label_id(code: &Code) -> u16 {
	let mut max_id = 0u16;
	for entry in &code.instructions {
		if let Some(label) = &entry.label {
			max_id = max_id.max(label.id);
		}
	}
	if let Some(label) = &code.last_label {
		max_id = max_id.max(label.id);
	}
	max_id.wrapping_add(1)
}

/// Runs the abstract interpreter over `code`, returning one [`StackMapData`](crate::visitor::method::code::StackMapData)-ready
/// `(instruction_index, locals, stack)` snapshot for every instruction that JVMS 4.10.1 requires a
/// frame at: every jump/switch target, the instruction right after an unconditional control
/// transfer (`GOTO`/`*RETURN`/`ATHROW`/`*SWITCH`), and every exception handler start.
///
/// `code.max_stack`/`code.max_locals` are not required to be set; this function only needs the
/// instruction stream, the exception table, and the method's own static-ness/descriptor (for the
/// initial locals frame). `this_class` is the class the method is declared on, used to resolve
/// what `UninitializedThis` becomes once a constructor's super/this call completes. `code` is
/// taken mutably because every `new` instruction needs a [`Label`] of its own to track the
/// resulting `Uninitialized` value (JVMS 4.7.4's `Uninitialized_variable_info` records the `new`
/// site by offset); a `new` instruction with no label yet is given a freshly minted one here so
/// the writer can resolve it like any other.
pub fn compute_frames(method_access: &MethodAccess, parameter_types: &[Type], this_class: &ClassName, code: &mut Code) -> Result<Vec<(usize, Vec<BasicValue>, Vec<BasicValue>)>> {
	let n = code.instructions.len();
	if n == 0 {
		return Ok(Vec::new());
	}

	let mut next_label_id = next_free_label_id(code);
	for entry in &mut code.instructions {
		if matches!(entry.instruction, Instruction::New(_)) && entry.label.is_none() {
			entry.label = Some(Label { id: next_label_id });
			next_label_id += 1;
		}
	}

	let label_index: HashMap<Label, usize> = code.instructions.iter().enumerate()
		.filter_map(|(i, entry)| entry.label.map(|l| (l, i)))
		.collect();
	let index_of = |label: &Label| -> Result<usize> {
		label_index.get(label).copied().ok_or_else(|| anyhow::anyhow!("label not found in instruction stream"))
	};

	let mut initial_locals = Vec::new();
	if !method_access.is_static {
		initial_locals.push(BasicValue::UninitializedThis);
	}
	for t in parameter_types {
		let v = BasicValue::of_type(t);
		let wide = matches!(v, BasicValue::Long | BasicValue::Double);
		initial_locals.push(v);
		if wide {
			initial_locals.push(BasicValue::Long2Top);
		}
	}

	let mut frame_in: Vec<Option<Frame>> = vec![None; n];
	frame_in[0] = Some(Frame { locals: initial_locals, stack: Vec::new() });

	for exception in &code.exception_table {
		let handler = index_of(&exception.handler)?;
		let catch = exception.catch.clone().unwrap_or_else(|| ClassName::new("java/lang/Throwable").unwrap());
		let handler_frame = Frame {
			locals: frame_in[0].as_ref().unwrap().locals.clone(),
			stack: vec![BasicValue::Object(catch)],
		};
		merge_or_init(&mut frame_in, handler, &handler_frame);
	}

	let mut worklist: VecDeque<usize> = (0..n).collect();
	let mut in_queue = vec![true; n];

	while let Some(i) = worklist.pop_front() {
		in_queue[i] = false;
		let Some(frame) = frame_in[i].clone() else { continue };

		let mut successors = Vec::new();
		let mut locals = frame.locals.clone();
		let mut stack = frame.stack.clone();
		let falls_through = step(&code.instructions[i].instruction, code.instructions[i].label, this_class, &mut locals, &mut stack, &mut successors, &index_of)?;

		if falls_through && i + 1 < n {
			successors.push(i + 1);
		}

		for &succ in &successors {
			let succ_frame = Frame { locals: locals.clone(), stack: stack.clone() };
			if merge_or_init(&mut frame_in, succ, &succ_frame) && !in_queue[succ] {
				in_queue[succ] = true;
				worklist.push_back(succ);
			}
		}
	}

	let mut needs_frame = vec![false; n];
	for i in 0..n {
		let mut successors = Vec::new();
		if let Some(frame) = &frame_in[i] {
			let mut locals = frame.locals.clone();
			let mut stack = frame.stack.clone();
			let falls_through = step(&code.instructions[i].instruction, code.instructions[i].label, this_class, &mut locals, &mut stack, &mut successors, &index_of)?;
			for &succ in &successors {
				needs_frame[succ] = true;
			}
			if !falls_through && i + 1 < n {
				needs_frame[i + 1] = true;
			}
		}
	}
	for exception in &code.exception_table {
		needs_frame[index_of(&exception.handler)?] = true;
	}

	let mut result = Vec::new();
	for i in 1..n {
		if needs_frame[i] {
			if let Some(frame) = &frame_in[i] {
				result.push((i, frame.locals.clone(), frame.stack.clone()));
			}
		}
	}
	Ok(result)
}

fn merge_or_init(frame_in: &mut [Option<Frame>], index: usize, incoming: &Frame) -> bool {
	match &mut frame_in[index] {
		Some(existing) => existing.merge_into(incoming),
		None => {
			frame_in[index] = Some(incoming.clone());
			true
		},
	}
}

/// Replaces every occurrence of `old` in `values` with a fresh copy of `new`, used to turn every
/// alias of an uninitialized `this`/`new` result into its now-initialized type once the matching
/// `<init>` call is seen.
fn replace_all(values: &mut [BasicValue], old: &BasicValue, new: &BasicValue) {
	for v in values.iter_mut() {
		if v == old {
			*v = new.clone();
		}
	}
}

/// Executes one instruction's stack/locals effect, pushing any jump targets into `successors`
/// (as instruction indices) and returning whether control can also fall through to the next
/// instruction. `label` is the label attached to this instruction, if any (every `new` is
/// guaranteed one by [`compute_frames`]'s pre-pass). `this_class` is what `UninitializedThis`
/// becomes once the constructor's super/this call completes.
fn step(
	instruction: &Instruction,
	label: Option<Label>,
	this_class: &ClassName,
	locals: &mut Vec<BasicValue>,
	stack: &mut Vec<BasicValue>,
	successors: &mut Vec<usize>,
	index_of: &impl Fn(&Label) -> Result<usize>,
) -> Result<bool> {
	use Instruction::*;

	macro_rules! set_local {
		($idx:expr, $value:expr) => {{
			let idx = $idx as usize;
			while locals.len() <= idx { locals.push(BasicValue::Top); }
			locals[idx] = $value;
		}};
	}

	Ok(match instruction {
		Nop => true,
		AConstNull => { push(stack, BasicValue::Null); true },
		IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5 | BiPush(_) | SiPush(_) => { push(stack, BasicValue::Integer); true },
		LConst0 | LConst1 => { push(stack, BasicValue::Long); true },
		FConst0 | FConst1 | FConst2 => { push(stack, BasicValue::Float); true },
		DConst0 | DConst1 => { push(stack, BasicValue::Double); true },
		Ldc(loadable) => {
			use crate::tree::method::code::Loadable;
			let v = match loadable {
				Loadable::Integer(_) => BasicValue::Integer,
				Loadable::Float(_) => BasicValue::Float,
				Loadable::Long(_) => BasicValue::Long,
				Loadable::Double(_) => BasicValue::Double,
				Loadable::Class(_) => BasicValue::Object(ClassName::new("java/lang/Class").unwrap()),
				Loadable::String(_) => BasicValue::Object(ClassName::new("java/lang/String").unwrap()),
				Loadable::MethodHandle(_) => BasicValue::Object(ClassName::new("java/lang/invoke/MethodHandle").unwrap()),
				Loadable::MethodType(_) => BasicValue::Object(ClassName::new("java/lang/invoke/MethodType").unwrap()),
				Loadable::Dynamic(dynamic) => BasicValue::of_type(&dynamic.descriptor.parse().unwrap_or(crate::tree::descriptor::ParsedFieldDescriptor(Type::I)).0),
			};
			push(stack, v);
			true
		},
		ILoad(i) => { push(stack, locals.get(i.index as usize).cloned().unwrap_or(BasicValue::Integer)); true },
		LLoad(i) => { push(stack, locals.get(i.index as usize).cloned().unwrap_or(BasicValue::Long)); true },
		FLoad(i) => { push(stack, locals.get(i.index as usize).cloned().unwrap_or(BasicValue::Float)); true },
		DLoad(i) => { push(stack, locals.get(i.index as usize).cloned().unwrap_or(BasicValue::Double)); true },
		ALoad(i) => { push(stack, locals.get(i.index as usize).cloned().unwrap_or_else(|| BasicValue::Object(ClassName::JAVA_LANG_OBJECT.to_owned()))); true },
		IALoad | BALoad | CALoad | SALoad => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Integer); true },
		LALoad => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Long); true },
		FALoad => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Float); true },
		DALoad => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Double); true },
		AALoad => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Object(ClassName::JAVA_LANG_OBJECT.to_owned())); true },
		IStore(i) => { let v = pop(stack)?; set_local!(i.index, v); true },
		LStore(i) => { let v = pop(stack)?; set_local!(i.index, v); set_local!(i.index + 1, BasicValue::Long2Top); true },
		FStore(i) => { let v = pop(stack)?; set_local!(i.index, v); true },
		DStore(i) => { let v = pop(stack)?; set_local!(i.index, v); set_local!(i.index + 1, BasicValue::Double2Top); true },
		AStore(i) => { let v = pop(stack)?; set_local!(i.index, v); true },
		IAStore | BAStore | CAStore | SAStore | FAStore | AAStore => { pop(stack)?; pop1(stack)?; pop1(stack)?; true },
		LAStore | DAStore => { pop(stack)?; pop1(stack)?; pop1(stack)?; true },
		Pop => { pop1(stack)?; true },
		Pop2 => { pop(stack)?; true },
		Dup => { let v = stack.last().cloned().ok_or_else(|| anyhow::anyhow!("stack underflow on dup"))?; stack.push(v); true },
		DupX1 => {
			let a = pop1(stack)?; let b = pop1(stack)?;
			stack.push(a.clone()); stack.push(b); stack.push(a);
			true
		},
		DupX2 => {
			let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?;
			stack.push(a.clone()); stack.push(c); stack.push(b); stack.push(a);
			true
		},
		Dup2 => {
			let a = pop1(stack)?; let b = pop1(stack)?;
			stack.push(b.clone()); stack.push(a.clone()); stack.push(b); stack.push(a);
			true
		},
		Dup2X1 => {
			let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?;
			stack.push(b.clone()); stack.push(a.clone()); stack.push(c); stack.push(b); stack.push(a);
			true
		},
		Dup2X2 => {
			let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?; let d = pop1(stack)?;
			stack.push(b.clone()); stack.push(a.clone()); stack.push(d); stack.push(c); stack.push(b); stack.push(a);
			true
		},
		Swap => { let a = pop1(stack)?; let b = pop1(stack)?; stack.push(a); stack.push(b); true },
		IAdd | ISub | IMul | IDiv | IRem | IShl | IShr | IUShr | IAnd | IOr | IXor => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Integer); true },
		LAdd | LSub | LMul | LDiv | LRem | LAnd | LOr | LXor => { pop(stack)?; pop(stack)?; push(stack, BasicValue::Long); true },
		LShl | LShr | LUShr => { pop1(stack)?; pop(stack)?; push(stack, BasicValue::Long); true },
		FAdd | FSub | FMul | FDiv | FRem => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Float); true },
		DAdd | DSub | DMul | DDiv | DRem => { pop(stack)?; pop(stack)?; push(stack, BasicValue::Double); true },
		INeg => { pop1(stack)?; push(stack, BasicValue::Integer); true },
		LNeg => { pop(stack)?; push(stack, BasicValue::Long); true },
		FNeg => { pop1(stack)?; push(stack, BasicValue::Float); true },
		DNeg => { pop(stack)?; push(stack, BasicValue::Double); true },
		IInc(i, _) => { let _ = i; true },
		I2L => { pop1(stack)?; push(stack, BasicValue::Long); true },
		I2F => { pop1(stack)?; push(stack, BasicValue::Float); true },
		I2D => { pop1(stack)?; push(stack, BasicValue::Double); true },
		L2I => { pop(stack)?; push(stack, BasicValue::Integer); true },
		L2F => { pop(stack)?; push(stack, BasicValue::Float); true },
		L2D => { pop(stack)?; push(stack, BasicValue::Double); true },
		F2I => { pop1(stack)?; push(stack, BasicValue::Integer); true },
		F2L => { pop1(stack)?; push(stack, BasicValue::Long); true },
		F2D => { pop1(stack)?; push(stack, BasicValue::Double); true },
		D2I => { pop(stack)?; push(stack, BasicValue::Integer); true },
		D2L => { pop(stack)?; push(stack, BasicValue::Long); true },
		D2F => { pop(stack)?; push(stack, BasicValue::Float); true },
		I2B | I2C | I2S => { pop1(stack)?; push(stack, BasicValue::Integer); true },
		LCmp => { pop(stack)?; pop(stack)?; push(stack, BasicValue::Integer); true },
		FCmpL | FCmpG => { pop1(stack)?; pop1(stack)?; push(stack, BasicValue::Integer); true },
		DCmpL | DCmpG => { pop(stack)?; pop(stack)?; push(stack, BasicValue::Integer); true },
		IfEq(l) | IfNe(l) | IfLt(l) | IfGe(l) | IfGt(l) | IfLe(l) | IfNull(l) | IfNonNull(l) => {
			pop1(stack)?;
			successors.push(index_of(l)?);
			true
		},
		IfICmpEq(l) | IfICmpNe(l) | IfICmpLt(l) | IfICmpGe(l) | IfICmpGt(l) | IfICmpLe(l) | IfACmpEq(l) | IfACmpNe(l) => {
			pop1(stack)?; pop1(stack)?;
			successors.push(index_of(l)?);
			true
		},
		Goto(l) => { successors.push(index_of(l)?); false },
		Jsr(l) => { successors.push(index_of(l)?); true },
		Ret(_) => false,
		TableSwitch { default, table, .. } => {
			pop1(stack)?;
			successors.push(index_of(default)?);
			for l in table { successors.push(index_of(l)?); }
			false
		},
		LookupSwitch { default, pairs } => {
			pop1(stack)?;
			successors.push(index_of(default)?);
			for (_, l) in pairs { successors.push(index_of(l)?); }
			false
		},
		IReturn | LReturn | FReturn | DReturn | AReturn => { pop(stack)?; false },
		Return => false,
		GetStatic(field_ref) => { push(stack, field_type_value(field_ref)); true },
		PutStatic(field_ref) => { let _ = field_type_value(field_ref); pop(stack)?; true },
		GetField(field_ref) => { pop1(stack)?; push(stack, field_type_value(field_ref)); true },
		PutField(field_ref) => { pop(stack)?; pop1(stack)?; true },
		InvokeVirtual(method_ref) | InvokeInterface(method_ref) => { invoke(stack, method_ref, true)?; true },
		InvokeSpecial(method_ref, _) => {
			use crate::tree::method::MethodName;
			let parsed = method_ref.desc.parse()?;
			for t in parsed.parameter_descriptors.iter().rev() {
				let _ = t;
				pop(stack)?;
			}
			let receiver = pop1(stack)?;
			if method_ref.name.as_slice() == MethodName::INIT {
				match &receiver {
					BasicValue::UninitializedThis => {
						let initialized = BasicValue::Object(this_class.clone());
						replace_all(locals, &receiver, &initialized);
						replace_all(stack, &receiver, &initialized);
					},
					BasicValue::Uninitialized(_) => {
						let initialized = BasicValue::Object(method_ref.class.clone());
						replace_all(locals, &receiver, &initialized);
						replace_all(stack, &receiver, &initialized);
					},
					_ => {},
				}
			}
			if let Some(t) = &parsed.return_descriptor {
				push(stack, BasicValue::of_type(t));
			}
			true
		},
		InvokeStatic(method_ref, _) => { invoke(stack, method_ref, false)?; true },
		InvokeDynamic(invoke_dynamic) => {
			let parsed = invoke_dynamic.descriptor.parse()?;
			for _ in &parsed.parameter_descriptors { pop(stack)?; }
			if let Some(t) = &parsed.return_descriptor { push(stack, BasicValue::of_type(t)); }
			true
		},
		New(class_name) => {
			let _ = class_name;
			let site = label.ok_or_else(|| anyhow::anyhow!("new instruction has no label to track its uninitialized result"))?;
			push(stack, BasicValue::Uninitialized(site));
			true
		},
		NewArray(array_type) => { pop1(stack)?; push(stack, BasicValue::Object(array_class_name(1, &to_descriptor_array_type(*array_type)))); true },
		ANewArray(class_name) => { pop1(stack)?; push(stack, BasicValue::Object(one_dim_array_of(class_name))); true },
		ArrayLength => { pop1(stack)?; push(stack, BasicValue::Integer); true },
		AThrow => { pop1(stack)?; false },
		CheckCast(class_name) => { pop1(stack)?; push(stack, BasicValue::Object(class_name.clone())); true },
		InstanceOf(_) => { pop1(stack)?; push(stack, BasicValue::Integer); true },
		MonitorEnter | MonitorExit => { pop1(stack)?; true },
		MultiANewArray(class_name, dims) => {
			for _ in 0..*dims { pop1(stack)?; }
			push(stack, BasicValue::Object(class_name.clone()));
			true
		},
	})
}

fn to_descriptor_array_type(t: crate::tree::method::code::ArrayType) -> crate::tree::descriptor::ArrayType {
	use crate::tree::method::code::ArrayType as CT;
	use crate::tree::descriptor::ArrayType as DT;
	match t {
		CT::Boolean => DT::Z, CT::Char => DT::C, CT::Float => DT::F, CT::Double => DT::D,
		CT::Byte => DT::B, CT::Short => DT::S, CT::Int => DT::I, CT::Long => DT::J,
	}
}

fn one_dim_array_of(class_name: &ClassName) -> ClassName {
	let mut s = java_string::JavaString::new();
	s.push('[');
	if class_name.as_inner().starts_with('[') {
		s.push_java_str(class_name.as_inner());
	} else {
		s.push('L');
		s.push_java_str(class_name.as_inner());
		s.push(';');
	}
	unsafe { ClassName::from_inner_unchecked(s) }
}

fn field_type_value(field_ref: &crate::tree::field::FieldRef) -> BasicValue {
	match field_ref.desc.as_inner().parse() {
		Ok(parsed) => BasicValue::of_type(&parsed.0),
		Err(_) => BasicValue::Object(ClassName::JAVA_LANG_OBJECT.to_owned()),
	}
}

fn invoke(stack: &mut Vec<BasicValue>, method_ref: &crate::tree::method::MethodRef, has_receiver: bool) -> Result<()> {
	let parsed = method_ref.desc.parse()?;
	for t in parsed.parameter_descriptors.iter().rev() {
		let _ = t;
		pop(stack)?;
	}
	if has_receiver {
		pop1(stack)?;
	}
	if let Some(t) = &parsed.return_descriptor {
		push(stack, BasicValue::of_type(t));
	}
	Ok(())
}

/// Strips the internal `Long2Top`/`Double2Top` placeholders, turning an interpreter snapshot into
/// the one-entry-per-variable form [`StackMapData`](crate::visitor::method::code::StackMapData) expects.
pub fn to_verification_type_infos(values: &[BasicValue]) -> Vec<VerificationTypeInfo> {
	values.iter()
		.filter(|v| !matches!(v, BasicValue::Long2Top | BasicValue::Double2Top))
		.map(|v| match v {
			BasicValue::Top => VerificationTypeInfo::Top,
			BasicValue::Integer => VerificationTypeInfo::Integer,
			BasicValue::Float => VerificationTypeInfo::Float,
			BasicValue::Long => VerificationTypeInfo::Long,
			BasicValue::Double => VerificationTypeInfo::Double,
			BasicValue::Null => VerificationTypeInfo::Null,
			BasicValue::UninitializedThis => VerificationTypeInfo::UninitializedThis,
			BasicValue::Object(name) => VerificationTypeInfo::Object(name.clone()),
			BasicValue::Uninitialized(label) => VerificationTypeInfo::Uninitialized(*label),
			BasicValue::Long2Top | BasicValue::Double2Top => unreachable!("filtered above"),
		})
		.collect()
}

/// Convenience wrapper computing frames for a whole [`Method`], reading `is_static` and parameter
/// types off it directly.
pub fn compute_frames_for_method(method: &Method, this_class: &ClassName, code: &mut Code) -> Result<Vec<(usize, Vec<BasicValue>, Vec<BasicValue>)>> {
	let parsed_descriptor = method.descriptor.parse()?;
	compute_frames(&method.access, &parsed_descriptor.parameter_descriptors, this_class, code)
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::tree::class::ClassName;
	use crate::tree::method::{MethodAccess, MethodDescriptor, MethodName, MethodRef};
	use crate::tree::method::code::{Code, Instruction, InstructionListEntry, Label, LvIndex};
	use super::{compute_frames, BasicValue};

	fn access(is_static: bool) -> MethodAccess {
		MethodAccess {
			is_public: true, is_private: false, is_protected: false, is_static,
			is_final: false, is_synchronized: false, is_bridge: false, is_varargs: false,
			is_native: false, is_abstract: false, is_strict: false, is_synthetic: false,
		}
	}

	fn label(id: u16) -> Label {
		Label { id }
	}

	fn entry(label: Option<Label>, instruction: Instruction) -> InstructionListEntry {
		InstructionListEntry { label, frame: None, instruction }
	}

	fn this_class() -> ClassName {
		ClassName::from("com/example/Widget")
	}

	fn super_init() -> MethodRef {
		MethodRef { class: ClassName::from("java/lang/Object"), name: MethodName::INIT.to_owned(), desc: MethodDescriptor::from("()V") }
	}

	/// A straight-line method body has no branch, so the verifier never needs a frame for it.
	#[test]
	fn straight_line_code_needs_no_frames() {
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::IConst0),
				entry(None, Instruction::IReturn),
			],
			last_label: Some(label(1)),
			..Code::default()
		};

		let frames = compute_frames(&access(true), &[], &this_class(), &mut code).unwrap();
		assert_eq!(frames, Vec::new());
	}

	/// `cond ? (local = 5) : (local = null)` joins with the same local holding an `int` on one path
	/// and a reference on the other; since that pair isn't one of the special-cased `Object`/`Null`
	/// combinations, the merge must fall back to `Top` rather than picking either.
	#[test]
	fn merging_incompatible_locals_produces_top() {
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::IConst0),
				entry(None, Instruction::IfEq(label(1))),
				entry(None, Instruction::IConst5),
				entry(None, Instruction::IStore(LvIndex { index: 1 })),
				entry(None, Instruction::Goto(label(2))),
				entry(Some(label(1)), Instruction::AConstNull),
				entry(None, Instruction::AStore(LvIndex { index: 1 })),
				entry(Some(label(2)), Instruction::Return),
			],
			last_label: Some(label(3)),
			..Code::default()
		};

		let frames = compute_frames(&access(true), &[], &this_class(), &mut code).unwrap();

		let join = frames.iter().find(|(i, _, _)| *i == 7).expect("join point needs a frame");
		assert_eq!(join.1[1], BasicValue::Top);
	}

	/// The first local slot of an instance method starts out as `UninitializedThis`; nothing in this
	/// piece of code ever calls a constructor on it, so that tag must survive unchanged all the way
	/// to a frame past a branch.
	#[test]
	fn instance_method_locals_start_with_this() {
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::Goto(label(1))),
				entry(Some(label(1)), Instruction::Return),
			],
			last_label: Some(label(2)),
			..Code::default()
		};

		let frames = compute_frames(&access(false), &[], &this_class(), &mut code).unwrap();
		let target = frames.iter().find(|(i, _, _)| *i == 1).expect("goto target needs a frame");
		assert_eq!(target.1[0], BasicValue::UninitializedThis);
	}

	/// Once a constructor's `invokespecial <init>` on `this` runs, the local slot holding
	/// `UninitializedThis` becomes `Object(this_class)` by the next frame, not the superclass
	/// named in the `<init>` call.
	#[test]
	fn super_call_initializes_every_alias_of_this() {
		// 0: goto L1 / L1: aload_0 ; invokespecial Object.<init> ; goto L2 / L2: return
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::Goto(label(1))),
				entry(Some(label(1)), Instruction::ALoad(LvIndex { index: 0 })),
				entry(None, Instruction::InvokeSpecial(super_init(), false)),
				entry(None, Instruction::Goto(label(2))),
				entry(Some(label(2)), Instruction::Return),
			],
			last_label: Some(label(3)),
			..Code::default()
		};

		let frames = compute_frames(&access(false), &[], &this_class(), &mut code).unwrap();
		let join = frames.iter().find(|(i, _, _)| *i == 4).expect("join point needs a frame");
		assert_eq!(join.1[0], BasicValue::Object(this_class()));
	}

	/// `new Widget(); invokespecial Widget.<init>()` must track the freshly allocated object as
	/// `Uninitialized(label_of_new)` until the matching `<init>` call, at which point it (and any
	/// other alias on the stack, e.g. from a `dup`) becomes `Object(Widget)`.
	#[test]
	fn new_then_init_produces_object_type() {
		let widget = ClassName::from("com/example/Widget");
		let widget_init = MethodRef { class: widget.clone(), name: MethodName::INIT.to_owned(), desc: MethodDescriptor::from("()V") };

		// 0: new Widget ; dup ; invokespecial Widget.<init> ; astore_1 ; goto L1 / L1: return
		let mut code = Code {
			instructions: vec![
				entry(Some(label(0)), Instruction::New(widget.clone())),
				entry(None, Instruction::Dup),
				entry(None, Instruction::InvokeSpecial(widget_init, false)),
				entry(None, Instruction::AStore(LvIndex { index: 1 })),
				entry(None, Instruction::Goto(label(1))),
				entry(Some(label(1)), Instruction::Return),
			],
			last_label: Some(label(2)),
			..Code::default()
		};

		let frames = compute_frames(&access(true), &[], &this_class(), &mut code).unwrap();
		let join = frames.iter().find(|(i, _, _)| *i == 5).expect("join point needs a frame");
		assert_eq!(join.1[1], BasicValue::Object(widget));

		// the `new` instruction must have gotten a label of its own so the writer can resolve
		// the `Uninitialized` entries that existed mid-interpretation.
		assert!(code.instructions[0].label.is_some());
	}
}
