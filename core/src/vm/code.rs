use std::fmt;

use hashbrown::HashMap;

use super::Instruction;

/// One compiled instruction sequence: `main`, a method body or a static
/// initializer.
#[derive(Clone, Default, PartialEq)]
pub struct Code {
    pub instructions: Vec<Instruction>,
    pub max_stack_size: usize,
}

impl Code {
    pub fn new(instructions: Vec<Instruction>, max_stack_size: usize) -> Self {
        Self {
            instructions,
            max_stack_size,
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Code {{")?;
        writeln!(f, "  max_stack_size: {}", self.max_stack_size)?;

        // Label every jump target, in address order.
        let mut targets: Vec<usize> = self
            .instructions
            .iter()
            .filter_map(Instruction::jump_target)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        let labels: HashMap<usize, usize> = targets
            .into_iter()
            .enumerate()
            .map(|(label, addr)| (addr, label))
            .collect();

        writeln!(f, "  instructions:")?;
        for (addr, instr) in self.instructions.iter().enumerate() {
            let label = labels
                .get(&addr)
                .map(|l| format!("L{l}:"))
                .unwrap_or_default();

            match instr.jump_target() {
                Some(target) => {
                    let target_label = labels
                        .get(&target)
                        .map(|l| format!("L{l}"))
                        .unwrap_or_else(|| format!("@{target}"));
                    writeln!(f, "    {addr:4} {label:>4}  {instr:?} (to {target_label})")?;
                }
                None => writeln!(f, "    {addr:4} {label:>4}  {instr:?}")?,
            }
        }

        // A jump may target the end of the sequence.
        if let Some(label) = labels.get(&self.instructions.len()) {
            writeln!(f, "    {:4} {:>4}", self.instructions.len(), format!("L{label}:"))?;
        }

        write!(f, "}}")
    }
}
