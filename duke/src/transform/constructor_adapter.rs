//! Splices advice around a method body: one block at the logical start of the method, one block
//! right before each normal exit.
//!
//! For a plain method this is trivial - the start is `visitCode`, the exits are every `*return`
//! and `athrow`. For a constructor it's not: `this` isn't a legal reference until the superclass
//! `<init>` has run, and that call can be nested arbitrarily deep in branches, ternaries and
//! argument expressions, so "the logical start" has to be *found* rather than assumed. This module
//! runs a lightweight, two-valued stack simulation (is this slot `UNINITIALIZED_THIS` or not) to
//! find the exact instruction after which advice becomes legal to insert.

use std::collections::HashMap;
use anyhow::{bail, Result};
use crate::tree::method::code::{Code, Instruction, InstructionListEntry, Label, Loadable};
use crate::tree::method::{MethodName, MethodRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    /// Placeholder occupying the second slot of a category-2 (long/double) value.
    Top2,
    Other,
    UninitializedThis,
}

fn push(stack: &mut Vec<Tag>, tag: Tag, wide: bool) {
    stack.push(tag);
    if wide {
        stack.push(Tag::Top2);
    }
}

fn pop1(stack: &mut Vec<Tag>) -> Result<Tag> {
    stack.pop().ok_or_else(|| anyhow::anyhow!("stack underflow while simulating constructor stack"))
}

fn pop(stack: &mut Vec<Tag>) -> Result<Tag> {
    let top = pop1(stack)?;
    if top == Tag::Top2 {
        pop1(stack)
    } else {
        Ok(top)
    }
}

/// Pops the arguments (by slot count) and then the receiver of an invocation, returning the
/// receiver's tag.
fn pop_invocation_args(stack: &mut Vec<Tag>, desc: &crate::tree::method::MethodDescriptor) -> Result<()> {
    let parsed = desc.parse()?;
    for t in parsed.parameter_descriptors.iter().rev() {
        if matches!(t, crate::tree::descriptor::Type::J | crate::tree::descriptor::Type::D) {
            pop(stack)?;
        } else {
            pop1(stack)?;
        }
    }
    Ok(())
}

fn push_return_value(stack: &mut Vec<Tag>, desc: &crate::tree::method::MethodDescriptor) -> Result<()> {
    let parsed = desc.parse()?;
    if let Some(t) = &parsed.return_descriptor {
        let wide = matches!(t, crate::tree::descriptor::Type::J | crate::tree::descriptor::Type::D);
        push(stack, Tag::Other, wide);
    }
    Ok(())
}

/// Executes one instruction's effect on the two-valued stack. Returns the forward jump targets
/// reached from this instruction (if any) paired with the stack snapshot to associate with them,
/// and whether control falls through to the next instruction.
fn step(instr: &Instruction, index: usize, stack: &mut Vec<Tag>, super_called: bool, is_static: bool) -> Result<(Vec<Label>, bool)> {
    use Instruction::*;
    let _ = index;

    let mut jump_targets = Vec::new();
    let falls_through = match instr {
        Nop => true,
        AConstNull => { push(stack, Tag::Other, false); true },
        IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5 | BiPush(_) | SiPush(_) => { push(stack, Tag::Other, false); true },
        LConst0 | LConst1 => { push(stack, Tag::Other, true); true },
        FConst0 | FConst1 | FConst2 => { push(stack, Tag::Other, false); true },
        DConst0 | DConst1 => { push(stack, Tag::Other, true); true },
        Ldc(loadable) => {
            let wide = matches!(loadable, Loadable::Long(_) | Loadable::Double(_));
            push(stack, Tag::Other, wide);
            true
        },
        ILoad(_) | FLoad(_) => { push(stack, Tag::Other, false); true },
        LLoad(_) | DLoad(_) => { push(stack, Tag::Other, true); true },
        ALoad(i) => {
            let tag = if i.index == 0 && !is_static && !super_called { Tag::UninitializedThis } else { Tag::Other };
            push(stack, tag, false);
            true
        },
        IALoad | FALoad | AALoad | BALoad | CALoad | SALoad => { pop1(stack)?; pop1(stack)?; push(stack, Tag::Other, false); true },
        LALoad | DALoad => { pop1(stack)?; pop1(stack)?; push(stack, Tag::Other, true); true },
        IStore(i) | FStore(i) | AStore(i) => { let _ = i; pop1(stack)?; true },
        LStore(i) | DStore(i) => { let _ = i; pop(stack)?; true },
        IAStore | FAStore | AAStore | BAStore | CAStore | SAStore => { pop1(stack)?; pop1(stack)?; pop1(stack)?; true },
        LAStore | DAStore => { pop(stack)?; pop1(stack)?; pop1(stack)?; true },
        Pop => { pop1(stack)?; true },
        Pop2 => { pop(stack)?; true },
        Dup => { let v = *stack.last().ok_or_else(|| anyhow::anyhow!("stack underflow on dup"))?; stack.push(v); true },
        DupX1 => { let a = pop1(stack)?; let b = pop1(stack)?; stack.push(a); stack.push(b); stack.push(a); true },
        DupX2 => { let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?; stack.push(a); stack.push(c); stack.push(b); stack.push(a); true },
        Dup2 => { let a = pop1(stack)?; let b = pop1(stack)?; stack.push(b); stack.push(a); stack.push(b); stack.push(a); true },
        Dup2X1 => { let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?; stack.push(b); stack.push(a); stack.push(c); stack.push(b); stack.push(a); true },
        Dup2X2 => { let a = pop1(stack)?; let b = pop1(stack)?; let c = pop1(stack)?; let d = pop1(stack)?; stack.push(b); stack.push(a); stack.push(d); stack.push(c); stack.push(b); stack.push(a); true },
        Swap => { let a = pop1(stack)?; let b = pop1(stack)?; stack.push(a); stack.push(b); true },
        IAdd | ISub | IMul | IDiv | IRem | IShl | IShr | IUShr | IAnd | IOr | IXor => { pop1(stack)?; pop1(stack)?; push(stack, Tag::Other, false); true },
        FAdd | FSub | FMul | FDiv | FRem => { pop1(stack)?; pop1(stack)?; push(stack, Tag::Other, false); true },
        LAdd | LSub | LMul | LDiv | LRem | LAnd | LOr | LXor => { pop(stack)?; pop(stack)?; push(stack, Tag::Other, true); true },
        LShl | LShr | LUShr => { pop1(stack)?; pop(stack)?; push(stack, Tag::Other, true); true },
        DAdd | DSub | DMul | DDiv | DRem => { pop(stack)?; pop(stack)?; push(stack, Tag::Other, true); true },
        INeg | FNeg => { pop1(stack)?; push(stack, Tag::Other, false); true },
        LNeg | DNeg => { pop(stack)?; push(stack, Tag::Other, true); true },
        IInc(_, _) => true,
        I2F | F2I | I2B | I2C | I2S => { pop1(stack)?; push(stack, Tag::Other, false); true },
        I2L | I2D => { pop1(stack)?; push(stack, Tag::Other, true); true },
        L2I | F2L | D2I => { let wide_in = matches!(instr, L2I | D2I); if wide_in { pop(stack)?; } else { pop1(stack)?; } let wide_out = matches!(instr, F2L); push(stack, Tag::Other, wide_out); true },
        L2F | D2F => { pop(stack)?; push(stack, Tag::Other, false); true },
        L2D | F2D => { if matches!(instr, L2D) { pop(stack)?; } else { pop1(stack)?; } push(stack, Tag::Other, true); true },
        D2L => { pop(stack)?; push(stack, Tag::Other, true); true },
        LCmp | DCmpL | DCmpG => { pop(stack)?; pop(stack)?; push(stack, Tag::Other, false); true },
        FCmpL | FCmpG => { pop1(stack)?; pop1(stack)?; push(stack, Tag::Other, false); true },
        IfEq(l) | IfNe(l) | IfLt(l) | IfGe(l) | IfGt(l) | IfLe(l) | IfNull(l) | IfNonNull(l) => { pop1(stack)?; jump_targets.push(*l); true },
        IfICmpEq(l) | IfICmpNe(l) | IfICmpLt(l) | IfICmpGe(l) | IfICmpGt(l) | IfICmpLe(l) | IfACmpEq(l) | IfACmpNe(l) => { pop1(stack)?; pop1(stack)?; jump_targets.push(*l); true },
        Goto(l) => { jump_targets.push(*l); false },
        Jsr(l) => { jump_targets.push(*l); push(stack, Tag::Other, false); true },
        Ret(_) => false,
        TableSwitch { default, table, .. } => { pop1(stack)?; jump_targets.push(*default); jump_targets.extend(table.iter().copied()); false },
        LookupSwitch { default, pairs } => { pop1(stack)?; jump_targets.push(*default); jump_targets.extend(pairs.iter().map(|(_, l)| *l)); false },
        IReturn | FReturn => { pop1(stack)?; false },
        LReturn | DReturn => { pop(stack)?; false },
        AReturn => { pop1(stack)?; false },
        Return => false,
        GetStatic(field_ref) => { push(stack, Tag::Other, matches!(field_ref.desc.as_inner().as_str(), "J" | "D")); true },
        PutStatic(_) => { pop1(stack)?; true },
        GetField(field_ref) => { pop1(stack)?; push(stack, Tag::Other, matches!(field_ref.desc.as_inner().as_str(), "J" | "D")); true },
        PutField(_) => { pop1(stack)?; pop1(stack)?; true },
        InvokeVirtual(method_ref) | InvokeInterface(method_ref) => { pop_invocation_args(stack, &method_ref.desc)?; pop1(stack)?; push_return_value(stack, &method_ref.desc)?; true },
        InvokeSpecial(method_ref, _) => { pop_invocation_args(stack, &method_ref.desc)?; pop1(stack)?; push_return_value(stack, &method_ref.desc)?; true },
        InvokeStatic(method_ref, _) => { pop_invocation_args(stack, &method_ref.desc)?; push_return_value(stack, &method_ref.desc)?; true },
        InvokeDynamic(invoke_dynamic) => {
            let parsed = invoke_dynamic.descriptor.parse()?;
            for t in &parsed.parameter_descriptors {
                if matches!(t, crate::tree::descriptor::Type::J | crate::tree::descriptor::Type::D) { pop(stack)?; } else { pop1(stack)?; }
            }
            if let Some(t) = &parsed.return_descriptor {
                push(stack, Tag::Other, matches!(t, crate::tree::descriptor::Type::J | crate::tree::descriptor::Type::D));
            }
            true
        },
        New(_) => { push(stack, Tag::Other, false); true },
        NewArray(_) => { pop1(stack)?; push(stack, Tag::Other, false); true },
        ANewArray(_) => { pop1(stack)?; push(stack, Tag::Other, false); true },
        ArrayLength => { pop1(stack)?; push(stack, Tag::Other, false); true },
        AThrow => { pop1(stack)?; false },
        CheckCast(_) => { pop1(stack)?; push(stack, Tag::Other, false); true },
        InstanceOf(_) => { pop1(stack)?; push(stack, Tag::Other, false); true },
        MonitorEnter | MonitorExit => { pop1(stack)?; true },
        MultiANewArray(_, dims) => { for _ in 0..*dims { pop1(stack)?; } push(stack, Tag::Other, false); true },
    };

    Ok((jump_targets, falls_through))
}

fn is_exit(instr: &Instruction) -> bool {
    matches!(instr,
        Instruction::IReturn | Instruction::LReturn | Instruction::FReturn |
        Instruction::DReturn | Instruction::AReturn | Instruction::Return |
        Instruction::AThrow)
}

fn is_return(instr: &Instruction) -> bool {
    matches!(instr,
        Instruction::IReturn | Instruction::LReturn | Instruction::FReturn |
        Instruction::DReturn | Instruction::AReturn | Instruction::Return)
}

fn to_entries(instructions: Vec<Instruction>) -> Vec<InstructionListEntry> {
    instructions.into_iter().map(|instruction| InstructionListEntry { label: None, frame: None, instruction }).collect()
}

/// Splices `on_method_enter()`'s instructions at the method's logical start and `on_method_exit()`'s
/// instructions before every normal exit (`*return`/`athrow`).
///
/// For a constructor (`is_constructor`), the logical start is the instruction right after the
/// first `invokespecial <init>` on the (possibly uninitialized) `this` reference - found by
/// simulating the operand stack forward, tagging `this` as `UNINITIALIZED_THIS` until that call.
/// Returns a **malformed-method** error if a `return` is reachable before that point.
pub fn adapt_constructor(
    is_static: bool,
    is_constructor: bool,
    code: Code,
    mut on_method_enter: impl FnMut() -> Vec<Instruction>,
    mut on_method_exit: impl FnMut() -> Vec<Instruction>,
) -> Result<Code> {
    if !is_constructor {
        let mut instructions = to_entries(on_method_enter());
        let Code { instructions: original, exception_table, last_label, line_numbers, local_variables,
            runtime_visible_type_annotations, runtime_invisible_type_annotations, attributes, .. } = code;
        for entry in original {
            if is_exit(&entry.instruction) {
                instructions.extend(to_entries(on_method_exit()));
            }
            instructions.push(entry);
        }
        return Ok(Code {
            max_stack: None,
            max_locals: None,
            instructions,
            exception_table,
            last_label,
            line_numbers,
            local_variables,
            runtime_visible_type_annotations,
            runtime_invisible_type_annotations,
            attributes,
        });
    }

    let mut stack: Vec<Tag> = Vec::new();
    let mut super_called = false;
    let mut jump_stack_frames: HashMap<Label, Vec<Tag>> = HashMap::new();
    let mut output = Vec::with_capacity(code.instructions.len());

    let Code { instructions, exception_table, last_label, line_numbers, local_variables,
        runtime_visible_type_annotations, runtime_invisible_type_annotations, attributes, .. } = code;

    for entry in instructions {
        if let Some(label) = &entry.label {
            if let Some(snapshot) = jump_stack_frames.remove(label) {
                stack = snapshot;
                super_called = false;
            }
        }

        if is_return(&entry.instruction) && !super_called {
            bail!("malformed method: constructor returns before calling the superclass constructor");
        }
        if is_exit(&entry.instruction) && super_called {
            output.extend(to_entries(on_method_exit()));
        }

        let is_init_call = matches!(&entry.instruction, Instruction::InvokeSpecial(MethodRef { name, .. }, _) if name.as_slice() == MethodName::INIT);
        let receiver_tag_before_call = if is_init_call && !super_called {
            if let Instruction::InvokeSpecial(method_ref, _) = &entry.instruction {
                let parsed = method_ref.desc.parse()?;
                let args_size: usize = parsed.parameter_descriptors.iter()
                    .map(|t| if matches!(t, crate::tree::descriptor::Type::J | crate::tree::descriptor::Type::D) { 2 } else { 1 })
                    .sum();
                stack.get(stack.len().saturating_sub(args_size + 1)).copied()
            } else {
                None
            }
        } else {
            None
        };

        let (jump_targets, _) = step(&entry.instruction, 0, &mut stack, super_called, is_static)?;

        if !super_called {
            for target in &jump_targets {
                jump_stack_frames.entry(*target).or_insert_with(|| stack.clone());
            }
        }

        output.push(entry);

        if is_init_call && receiver_tag_before_call == Some(Tag::UninitializedThis) {
            super_called = true;
            output.extend(to_entries(on_method_enter()));
        }
    }

    Ok(Code {
        max_stack: None,
        max_locals: None,
        instructions: output,
        exception_table,
        last_label,
        line_numbers,
        local_variables,
        runtime_visible_type_annotations,
        runtime_invisible_type_annotations,
        attributes,
    })
}

#[cfg(test)]
mod testing {
    use crate::tree::class::ClassName;
    use crate::tree::method::code::{Code, Instruction, InstructionListEntry, Label, LvIndex};
    use crate::tree::method::{MethodDescriptor, MethodName, MethodRef};
    use super::adapt_constructor;

    fn label(id: u16) -> Label { Label { id } }

    fn entry(label: Option<Label>, instruction: Instruction) -> InstructionListEntry {
        InstructionListEntry { label, frame: None, instruction }
    }

    fn super_init() -> MethodRef {
        MethodRef { class: ClassName::from("java/lang/Object"), name: MethodName::INIT.to_owned(), desc: MethodDescriptor::from("()V") }
    }

    #[test]
    fn simple_constructor_gets_advice_after_super_call() {
        // 0: aload_0
        // 1: invokespecial Object.<init>
        // 2: return
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::ALoad(LvIndex { index: 0 })),
                entry(None, Instruction::InvokeSpecial(super_init(), false)),
                entry(None, Instruction::Return),
            ],
            ..Code::default()
        };

        let result = adapt_constructor(false, true, code, || vec![Instruction::Nop], || vec![Instruction::Pop]).unwrap();

        let positions: Vec<&Instruction> = result.instructions.iter().map(|e| &e.instruction).collect();
        let init_pos = positions.iter().position(|i| matches!(i, Instruction::InvokeSpecial(_, _))).unwrap();
        assert!(matches!(positions[init_pos + 1], Instruction::Nop), "on_method_enter must run right after the super call");
        let return_pos = positions.iter().position(|i| matches!(i, Instruction::Return)).unwrap();
        assert!(matches!(positions[return_pos - 1], Instruction::Pop), "on_method_exit must run right before the return");
    }

    #[test]
    fn return_before_super_call_is_malformed() {
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::Return),
            ],
            ..Code::default()
        };
        assert!(adapt_constructor(false, true, code, || vec![], || vec![]).is_err());
    }

    #[test]
    fn non_constructor_gets_advice_at_start_and_every_exit() {
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::IConst0),
                entry(None, Instruction::IReturn),
            ],
            ..Code::default()
        };

        let result = adapt_constructor(false, false, code, || vec![Instruction::Nop], || vec![Instruction::Pop]).unwrap();
        assert!(matches!(result.instructions[0].instruction, Instruction::Nop));
        let return_pos = result.instructions.iter().position(|e| matches!(e.instruction, Instruction::IReturn)).unwrap();
        assert!(matches!(result.instructions[return_pos - 1].instruction, Instruction::Pop));
    }
}
