//! Rewrites pre-JDK-6 subroutine (`JSR`/`RET`) bytecode into an equivalent `JSR`-free form by
//! duplicating each subroutine's body once per call site.
//!
//! Subroutines exist only because old `javac` versions shared the bytecode for a `finally` block
//! between the normal and exceptional exit paths, entered with `jsr` and left with `ret`. No
//! verifier since JDK 6 accepts them, so every subroutine reachable from a method's code gets
//! inlined: each `jsr` is replaced with `aconst_null ; goto <copy of the subroutine>`, and each
//! `ret` inside a copy becomes a `goto` back to the point right after the `jsr` that produced it.

use std::collections::{HashMap, HashSet, VecDeque};
use anyhow::{bail, Result};
use crate::tree::method::code::{Code, Exception, Instruction, InstructionListEntry, Label, LabelRange, Lv};

/// Mints labels that don't collide with any label already present in a buffered method, mirroring
/// [`crate::class_reader::labels::Labels`]'s id-allocation pattern.
struct LabelAllocator {
    next_id: u16,
}

impl LabelAllocator {
    fn for_code(code: &Code) -> LabelAllocator {
        let mut max_id = 0u16;
        for entry in &code.instructions {
            if let Some(label) = &entry.label {
                max_id = max_id.max(label.id);
            }
        }
        if let Some(label) = &code.last_label {
            max_id = max_id.max(label.id);
        }
        LabelAllocator { next_id: max_id.wrapping_add(1) }
    }

    fn mint(&mut self) -> Label {
        let label = Label { id: self.next_id };
        self.next_id += 1;
        label
    }
}

/// A subroutine is identified by the instruction index its entry `Label` resolves to; id `0` is
/// reserved for the method's main flow (which isn't a "real" subroutine, but is treated as one to
/// keep the instantiation machinery uniform).
struct Subroutines {
    /// `entry index -> subroutine id` (id `0` is the main flow, entry index `0`).
    entry_to_id: HashMap<usize, usize>,
    /// `subroutine id -> set of instruction indices it owns`.
    owned: Vec<HashSet<usize>>,
}

fn handler_targets(code: &Code, index_of: &HashMap<Label, usize>, n: usize) -> Result<Vec<Vec<usize>>> {
    let mut targets = vec![Vec::new(); n];
    for exception in &code.exception_table {
        let start = *index_of.get(&exception.start).ok_or_else(|| anyhow::anyhow!("dangling exception start label"))?;
        let end = end_index(code, index_of, &exception.end)?;
        let handler = *index_of.get(&exception.handler).ok_or_else(|| anyhow::anyhow!("dangling exception handler label"))?;
        for i in start..end.min(n) {
            targets[i].push(handler);
        }
    }
    Ok(targets)
}

fn end_index(code: &Code, index_of: &HashMap<Label, usize>, label: &Label) -> Result<usize> {
    if code.last_label.as_ref() == Some(label) {
        return Ok(code.instructions.len());
    }
    index_of.get(label).copied().ok_or_else(|| anyhow::anyhow!("dangling label"))
}

/// Computes, for instruction `i`, the successors to use while discovering subroutine ownership: a
/// `jsr` only "falls through" to the instruction after it (the target belongs to a different
/// subroutine), and `ret` has no successor at all (its real target is dynamic).
fn ownership_successors(instr: &Instruction, i: usize, n: usize, index_of: &HashMap<Label, usize>) -> Result<(Vec<usize>, bool)> {
    use Instruction::*;
    Ok(match instr {
        IfEq(l) | IfNe(l) | IfLt(l) | IfGe(l) | IfGt(l) | IfLe(l) | IfNull(l) | IfNonNull(l)
        | IfICmpEq(l) | IfICmpNe(l) | IfICmpLt(l) | IfICmpGe(l) | IfICmpGt(l) | IfICmpLe(l)
        | IfACmpEq(l) | IfACmpNe(l) => (vec![*index_of.get(l).ok_or_else(|| anyhow::anyhow!("dangling branch label"))?], true),
        Goto(l) => (vec![*index_of.get(l).ok_or_else(|| anyhow::anyhow!("dangling goto label"))?], false),
        Jsr(_) => (Vec::new(), true),
        Ret(_) => (Vec::new(), false),
        TableSwitch { default, table, .. } => {
            let mut succ = vec![*index_of.get(default).ok_or_else(|| anyhow::anyhow!("dangling switch label"))?];
            for l in table {
                succ.push(*index_of.get(l).ok_or_else(|| anyhow::anyhow!("dangling switch label"))?);
            }
            (succ, false)
        },
        LookupSwitch { default, pairs } => {
            let mut succ = vec![*index_of.get(default).ok_or_else(|| anyhow::anyhow!("dangling switch label"))?];
            for (_, l) in pairs {
                succ.push(*index_of.get(l).ok_or_else(|| anyhow::anyhow!("dangling switch label"))?);
            }
            (succ, false)
        },
        IReturn | LReturn | FReturn | DReturn | AReturn | Return | AThrow => (Vec::new(), false),
        _ => (if i + 1 < n { vec![i + 1] } else { Vec::new() }, true),
    })
}

fn discover_subroutine(entry: usize, n: usize, code: &Code, index_of: &HashMap<Label, usize>, handlers: &[Vec<usize>]) -> Result<HashSet<usize>> {
    let mut owned = HashSet::new();
    let mut stack = vec![entry];
    while let Some(i) = stack.pop() {
        if i >= n || !owned.insert(i) {
            continue;
        }
        let (mut succ, falls_through) = ownership_successors(&code.instructions[i].instruction, i, n, index_of)?;
        if falls_through {
            if let Instruction::Jsr(_) = &code.instructions[i].instruction {
                if i + 1 < n {
                    succ.push(i + 1);
                }
            }
        }
        succ.extend(handlers[i].iter().copied());
        stack.extend(succ);
    }
    Ok(owned)
}

fn find_subroutines(code: &Code, n: usize, index_of: &HashMap<Label, usize>) -> Result<Subroutines> {
    let mut entry_to_id = HashMap::new();
    entry_to_id.insert(0, 0);

    for entry in &code.instructions {
        if let Instruction::Jsr(target) = &entry.instruction {
            let target_index = *index_of.get(target).ok_or_else(|| anyhow::anyhow!("dangling jsr target"))?;
            if !entry_to_id.contains_key(&target_index) {
                let id = entry_to_id.len();
                entry_to_id.insert(target_index, id);
            }
        }
    }

    let handlers = handler_targets(code, index_of, n)?;

    let mut by_id: Vec<(usize, usize)> = entry_to_id.iter().map(|(&entry, &id)| (id, entry)).collect();
    by_id.sort_by_key(|&(id, _)| id);

    let mut owned = vec![HashSet::new(); by_id.len()];
    for (id, entry) in by_id {
        owned[id] = discover_subroutine(entry, n, code, index_of, &handlers)?;
    }

    Ok(Subroutines { entry_to_id, owned })
}

fn check_no_recursive_jsr(code: &Code, subroutines: &Subroutines, index_of: &HashMap<Label, usize>) -> Result<()> {
    let count = subroutines.owned.len();
    let mut calls: Vec<HashSet<usize>> = vec![HashSet::new(); count];
    for (&entry_index, &id) in &subroutines.entry_to_id {
        let _ = entry_index;
        for &i in &subroutines.owned[id] {
            if let Instruction::Jsr(target) = &code.instructions[i].instruction {
                let target_index = *index_of.get(target).ok_or_else(|| anyhow::anyhow!("dangling jsr target"))?;
                if let Some(&callee) = subroutines.entry_to_id.get(&target_index) {
                    calls[id].insert(callee);
                }
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Color { White, Gray, Black }
    let mut color = vec![Color::White; count];

    fn visit(id: usize, calls: &[HashSet<usize>], color: &mut Vec<Color>) -> Result<()> {
        color[id] = Color::Gray;
        for &callee in &calls[id] {
            match color[callee] {
                Color::Gray => bail!("malformed method: recursive JSR through subroutine {callee}"),
                Color::White => visit(callee, calls, color)?,
                Color::Black => {},
            }
        }
        color[id] = Color::Black;
        Ok(())
    }

    for id in 0..count {
        if color[id] == Color::White {
            visit(id, &calls, &mut color)?;
        }
    }
    Ok(())
}

fn check_no_stray_ret(code: &Code, subroutines: &Subroutines) -> Result<()> {
    for (i, entry) in code.instructions.iter().enumerate() {
        if let Instruction::Ret(_) = &entry.instruction {
            let owned_by_a_subroutine = subroutines.owned.iter().skip(1).any(|set| set.contains(&i));
            if !owned_by_a_subroutine {
                bail!("malformed method: RET at instruction {i} is not reachable from any subroutine");
            }
        }
    }
    Ok(())
}

struct Instantiation {
    subroutine: usize,
    parent: Option<usize>,
    /// `original label -> label used by this instantiation`, inherited from the parent and
    /// extended with every label this instantiation mints for itself.
    label_remap: HashMap<Label, Label>,
    /// Original instruction indices emitted directly by this instantiation (as opposed to
    /// inherited from an ancestor that already owns them).
    own_indices: HashSet<usize>,
    /// `None` for the main flow; `Some` for a subroutine instantiation, the label to `goto` on
    /// encountering a `ret` owned by this instantiation.
    return_label: Option<Label>,
    /// `original index -> label forced onto that instruction when this instantiation emits it`,
    /// used to make the instruction right after a `jsr` carry that `jsr`'s return label.
    forced_label: HashMap<usize, Label>,
}

fn owning_instantiation_for_ret<'a>(chain: &[usize], instantiations: &'a [Instantiation], ret_index: usize) -> &'a Instantiation {
    for &id in chain {
        if instantiations[id].own_indices.contains(&ret_index) {
            return &instantiations[id];
        }
    }
    instantiations.last().expect("chain is non-empty")
}

fn resolve(label_remap: &HashMap<Label, Label>, old: Label) -> Result<Label> {
    label_remap.get(&old).copied().ok_or_else(|| anyhow::anyhow!("jsr inliner: label {old:?} not in scope of the instantiation referencing it"))
}

fn remap_instruction(instr: Instruction, label_remap: &HashMap<Label, Label>, goto_for_ret: Label) -> Result<Instruction> {
    use Instruction::*;
    Ok(match instr {
        IfEq(l) => IfEq(resolve(label_remap, l)?), IfNe(l) => IfNe(resolve(label_remap, l)?),
        IfLt(l) => IfLt(resolve(label_remap, l)?), IfGe(l) => IfGe(resolve(label_remap, l)?),
        IfGt(l) => IfGt(resolve(label_remap, l)?), IfLe(l) => IfLe(resolve(label_remap, l)?),
        IfNull(l) => IfNull(resolve(label_remap, l)?), IfNonNull(l) => IfNonNull(resolve(label_remap, l)?),
        IfICmpEq(l) => IfICmpEq(resolve(label_remap, l)?), IfICmpNe(l) => IfICmpNe(resolve(label_remap, l)?),
        IfICmpLt(l) => IfICmpLt(resolve(label_remap, l)?), IfICmpGe(l) => IfICmpGe(resolve(label_remap, l)?),
        IfICmpGt(l) => IfICmpGt(resolve(label_remap, l)?), IfICmpLe(l) => IfICmpLe(resolve(label_remap, l)?),
        IfACmpEq(l) => IfACmpEq(resolve(label_remap, l)?), IfACmpNe(l) => IfACmpNe(resolve(label_remap, l)?),
        Goto(l) => Goto(resolve(label_remap, l)?),
        TableSwitch { default, low, high, table } => TableSwitch {
            default: resolve(label_remap, default)?,
            low, high,
            table: table.into_iter().map(|l| resolve(label_remap, l)).collect::<Result<_>>()?,
        },
        LookupSwitch { default, pairs } => LookupSwitch {
            default: resolve(label_remap, default)?,
            pairs: pairs.into_iter().map(|(k, l)| Ok((k, resolve(label_remap, l)?))).collect::<Result<_>>()?,
        },
        Ret(_) => Goto(goto_for_ret),
        other => other,
    })
}

/// Rewrites `code` so that it contains no `jsr`/`ret` instructions, by duplicating each
/// subroutine's body once per call site it's instantiated from.
///
/// Returns a **malformed-method** error if a `ret` is reachable outside any subroutine, or if a
/// subroutine transitively calls itself.
pub fn inline_jsrs(code: Code) -> Result<Code> {
    let n = code.instructions.len();
    if n == 0 || !code.instructions.iter().any(|e| matches!(e.instruction, Instruction::Jsr(_) | Instruction::Ret(_))) {
        return Ok(code);
    }

    let index_of: HashMap<Label, usize> = code.instructions.iter().enumerate()
        .filter_map(|(i, e)| e.label.map(|l| (l, i)))
        .collect();

    let subroutines = find_subroutines(&code, n, &index_of)?;
    check_no_recursive_jsr(&code, &subroutines, &index_of)?;
    check_no_stray_ret(&code, &subroutines)?;

    let mut allocator = LabelAllocator::for_code(&code);
    let mut instantiations: Vec<Instantiation> = vec![Instantiation {
        subroutine: 0,
        parent: None,
        label_remap: HashMap::new(),
        own_indices: HashSet::new(),
        return_label: None,
        forced_label: HashMap::new(),
    }];
    let mut output: Vec<InstructionListEntry> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::from([0]);

    while let Some(id) = queue.pop_front() {
        let chain = {
            let mut chain = Vec::new();
            let mut cur = Some(id);
            while let Some(c) = cur {
                chain.push(c);
                cur = instantiations[c].parent;
            }
            chain.reverse();
            chain
        };

        let subroutine_id = instantiations[id].subroutine;
        let mut owned: Vec<usize> = subroutines.owned[subroutine_id].iter().copied().collect();
        owned.sort_unstable();

        for i in owned {
            let owning_ancestor = chain[..chain.len() - 1].iter().copied()
                .find(|&a| instantiations[a].own_indices.contains(&i));
            if let Some(ancestor_id) = owning_ancestor {
                // The oldest instantiation to reach this instruction already emitted it; this
                // instantiation must not duplicate it, but any branch of its own that targets
                // `i`'s label still needs to resolve to the label the ancestor actually attached,
                // not a fresh one nothing will ever mark.
                if let Some(old) = code.instructions[i].label {
                    if let Some(&ancestor_label) = instantiations[ancestor_id].label_remap.get(&old) {
                        instantiations[id].label_remap.insert(old, ancestor_label);
                    }
                }
                continue;
            }

            let original = &code.instructions[i];

            let new_label = if let Some(forced) = instantiations[id].forced_label.remove(&i) {
                if let Some(old) = original.label {
                    instantiations[id].label_remap.insert(old, forced);
                }
                Some(forced)
            } else if let Some(old) = original.label {
                let label = *instantiations[id].label_remap.entry(old).or_insert_with(|| allocator.mint());
                Some(label)
            } else {
                None
            };

            instantiations[id].own_indices.insert(i);

            if let Instruction::Jsr(target) = &original.instruction {
                let target_index = *index_of.get(target).expect("already validated");
                let callee_subroutine = *subroutines.entry_to_id.get(&target_index).expect("jsr target is always a subroutine entry");

                let return_label = allocator.mint();

                // If an ancestor in this chain already owns the subroutine's entry instruction
                // (shared trailing code between overlapping subroutines), it already assigned a
                // label to it; reuse that label instead of minting one nothing will ever attach,
                // which left the `goto` below targeting a label the writer could never resolve.
                let entry_label = chain.iter().copied()
                    .find(|&a| instantiations[a].own_indices.contains(&target_index))
                    .and_then(|a| instantiations[a].label_remap.get(target).copied())
                    .unwrap_or_else(|| allocator.mint());

                let mut child_remap = instantiations[id].label_remap.clone();
                child_remap.insert(*target, entry_label);
                let child_id = instantiations.len();
                instantiations.push(Instantiation {
                    subroutine: callee_subroutine,
                    parent: Some(id),
                    label_remap: child_remap,
                    own_indices: HashSet::new(),
                    return_label: Some(return_label),
                    forced_label: HashMap::new(),
                });
                queue.push_back(child_id);

                output.push(InstructionListEntry { label: new_label, frame: None, instruction: Instruction::AConstNull });
                output.push(InstructionListEntry { label: None, frame: None, instruction: Instruction::Goto(entry_label) });

                if i + 1 < n {
                    instantiations[id].forced_label.insert(i + 1, return_label);
                }
                continue;
            }

            let goto_for_ret = if matches!(original.instruction, Instruction::Ret(_)) {
                owning_instantiation_for_ret(&chain, &instantiations, i).return_label
                    .expect("ret is always owned by some subroutine instantiation")
            } else {
                // unused placeholder, remap_instruction only consults it for Ret
                Label { id: 0 }
            };

            let label_remap = &instantiations[id].label_remap;
            let instruction = remap_instruction(original.instruction.clone(), label_remap, goto_for_ret)?;
            output.push(InstructionListEntry { label: new_label, frame: None, instruction });
        }
    }

    let last_label = code.last_label
        .map(|old| resolve(&instantiations[0].label_remap, old))
        .transpose()?
        .or_else(|| code.last_label.map(|_| allocator.mint()));

    let exception_table = remap_exception_table(&code.exception_table, &instantiations);
    let local_variables = code.local_variables.as_ref()
        .map(|lvs| remap_local_variables(lvs, &instantiations));

    Ok(Code {
        max_stack: None,
        max_locals: None,
        instructions: output,
        exception_table,
        last_label,
        line_numbers: None,
        local_variables,
        runtime_visible_type_annotations: code.runtime_visible_type_annotations,
        runtime_invisible_type_annotations: code.runtime_invisible_type_annotations,
        attributes: code.attributes,
    })
}

/// Clones each try/catch entry into every instantiation whose own (non-inherited) labels fully
/// cover its range, re-projecting it onto that instantiation's labels.
fn remap_exception_table(exception_table: &[Exception], instantiations: &[Instantiation]) -> Vec<Exception> {
    let mut result = Vec::new();
    for exception in exception_table {
        for inst in instantiations {
            if let (Some(&start), Some(&end), Some(&handler)) = (
                inst.label_remap.get(&exception.start),
                inst.label_remap.get(&exception.end),
                inst.label_remap.get(&exception.handler),
            ) {
                result.push(Exception { start, end, handler, catch: exception.catch.clone() });
            }
        }
    }
    result
}

fn remap_local_variables(lvs: &[Lv], instantiations: &[Instantiation]) -> Vec<Lv> {
    let mut result = Vec::new();
    for lv in lvs {
        for inst in instantiations {
            if let (Some(&start), Some(&end)) = (
                inst.label_remap.get(&lv.range.start),
                inst.label_remap.get(&lv.range.end),
            ) {
                result.push(Lv {
                    range: LabelRange { start, end },
                    name: lv.name.clone(),
                    descriptor: lv.descriptor.clone(),
                    signature: lv.signature.clone(),
                    index: lv.index,
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod testing {
    use crate::tree::method::code::{Code, Instruction, InstructionListEntry, Label, LvIndex};
    use super::inline_jsrs;

    fn label(id: u16) -> Label { Label { id } }

    fn entry(label: Option<Label>, instruction: Instruction) -> InstructionListEntry {
        InstructionListEntry { label, frame: None, instruction }
    }

    #[test]
    fn code_without_jsr_is_untouched() {
        let code = Code {
            instructions: vec![entry(Some(label(0)), Instruction::Return)],
            last_label: Some(label(1)),
            ..Code::default()
        };
        let result = inline_jsrs(code.clone()).unwrap();
        assert_eq!(result.instructions, code.instructions);
    }

    #[test]
    fn single_jsr_subroutine_is_inlined_without_jsr_or_ret() {
        // 0: jsr -> 2 (subroutine entry)
        // 1: return
        // 2: astore 1 (subroutine entry)
        // 3: ret 1
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::Jsr(label(2))),
                entry(Some(label(1)), Instruction::Return),
                entry(Some(label(2)), Instruction::AStore(LvIndex { index: 1 })),
                entry(Some(label(3)), Instruction::Ret(LvIndex { index: 1 })),
            ],
            last_label: Some(label(4)),
            ..Code::default()
        };

        let result = inline_jsrs(code).unwrap();

        assert!(result.instructions.iter().all(|e| !matches!(e.instruction, Instruction::Jsr(_) | Instruction::Ret(_))));
        assert!(result.instructions.iter().any(|e| matches!(e.instruction, Instruction::AConstNull)));
        assert!(result.instructions.iter().any(|e| matches!(e.instruction, Instruction::AStore(_))));
    }

    #[test]
    fn ret_outside_any_subroutine_is_malformed() {
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::Ret(LvIndex { index: 1 })),
            ],
            last_label: Some(label(1)),
            ..Code::default()
        };
        assert!(inline_jsrs(code).is_err());
    }

    #[test]
    fn recursive_jsr_is_malformed() {
        // 0: jsr -> 0 (calls itself)
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::Jsr(label(0))),
            ],
            last_label: Some(label(1)),
            ..Code::default()
        };
        assert!(inline_jsrs(code).is_err());
    }

    #[test]
    fn jsr_called_twice_duplicates_the_subroutine_body() {
        // 0: jsr -> 3
        // 1: jsr -> 3
        // 2: return
        // 3: astore 1 (subroutine entry)
        // 4: ret 1
        let code = Code {
            instructions: vec![
                entry(Some(label(0)), Instruction::Jsr(label(3))),
                entry(Some(label(1)), Instruction::Jsr(label(3))),
                entry(Some(label(2)), Instruction::Return),
                entry(Some(label(3)), Instruction::AStore(LvIndex { index: 1 })),
                entry(Some(label(4)), Instruction::Ret(LvIndex { index: 1 })),
            ],
            last_label: Some(label(5)),
            ..Code::default()
        };

        let result = inline_jsrs(code).unwrap();

        let astore_count = result.instructions.iter().filter(|e| matches!(e.instruction, Instruction::AStore(_))).count();
        assert_eq!(astore_count, 2, "the subroutine body should be duplicated once per call site");
    }
}
