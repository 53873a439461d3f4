//! A tiny executor for the assembly brainfry emits.
//!
//! It understands exactly the instruction forms the code generator produces
//! (mov, movzx, add, sub, test, jz, jnz, syscall) so the behaviour of a
//! compiled program can be checked without nasm or ld. Cells are modelled as
//! 64-bit words keyed by address; untouched words read as zero.

use std::collections::HashMap;

const STACK_TOP: u64 = 0x7fff_0000;
const SUM_ADDR: u64 = 0x1000;
const INPUT_ADDR: u64 = 0x2000;
const STEP_LIMIT: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Reg(String),
    Imm(u64),
    Symbol(String),
    Mem(String),
    ByteMem(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Instr {
    Mov(Operand, Operand),
    Movzx(Operand, Operand),
    Add(Operand, Operand),
    Sub(Operand, Operand),
    Test(Operand, Operand),
    Jz(String),
    Jnz(String),
    Syscall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub output: Vec<u8>,
    pub exit_code: u64,
    pub reads: usize,
    pub steps: usize,
}

pub fn execute(asm: &str, input: &[u8]) -> Run {
    let (program, labels) = parse(asm);
    let mut machine = Machine {
        regs: HashMap::new(),
        words: HashMap::new(),
        bytes: HashMap::new(),
        zero_flag: false,
        input: input.iter().copied().collect(),
        output: Vec::new(),
        reads: 0,
    };
    machine.regs.insert("rsp".to_string(), STACK_TOP);

    let mut pc = 0;
    let mut steps = 0;
    while pc < program.len() {
        steps += 1;
        assert!(steps < STEP_LIMIT, "program did not terminate");
        let mut next = pc + 1;
        match &program[pc] {
            Instr::Mov(dst, src) => {
                let value = machine.read(src);
                machine.write(dst, value);
            }
            Instr::Movzx(dst, src) => {
                let value = machine.read(src) & 0xff;
                machine.write(dst, value);
            }
            Instr::Add(dst, src) => {
                let value = machine.read(dst).wrapping_add(machine.read(src));
                machine.write(dst, value);
            }
            Instr::Sub(dst, src) => {
                let value = machine.read(dst).wrapping_sub(machine.read(src));
                machine.write(dst, value);
            }
            Instr::Test(a, b) => {
                machine.zero_flag = machine.read(a) & machine.read(b) == 0;
            }
            Instr::Jz(label) => {
                if machine.zero_flag {
                    next = labels[label];
                }
            }
            Instr::Jnz(label) => {
                if !machine.zero_flag {
                    next = labels[label];
                }
            }
            Instr::Syscall => {
                if let Some(code) = machine.syscall() {
                    return Run {
                        output: machine.output,
                        exit_code: code,
                        reads: machine.reads,
                        steps,
                    };
                }
            }
        }
        pc = next;
    }
    panic!("fell off the end of the program without exiting");
}

struct Machine {
    regs: HashMap<String, u64>,
    words: HashMap<u64, u64>,
    bytes: HashMap<u64, u8>,
    zero_flag: bool,
    input: std::collections::VecDeque<u8>,
    output: Vec<u8>,
    reads: usize,
}

impl Machine {
    fn reg(&self, name: &str) -> u64 {
        match name {
            "al" => self.reg("rax") & 0xff,
            _ => self.regs.get(name).copied().unwrap_or(0),
        }
    }

    fn read(&self, operand: &Operand) -> u64 {
        match operand {
            Operand::Reg(name) => self.reg(name),
            Operand::Imm(value) => *value,
            Operand::Symbol(name) => symbol_addr(name),
            Operand::Mem(base) if is_register(base) => {
                self.words.get(&self.reg(base)).copied().unwrap_or(0)
            }
            Operand::Mem(name) | Operand::ByteMem(name) => {
                u64::from(self.bytes.get(&symbol_addr(name)).copied().unwrap_or(0))
            }
        }
    }

    fn write(&mut self, operand: &Operand, value: u64) {
        match operand {
            Operand::Reg(name) => {
                assert_ne!(name, "al", "partial register writes are not emitted");
                self.regs.insert(name.clone(), value);
            }
            Operand::Mem(base) if is_register(base) => {
                let addr = self.reg(base);
                self.words.insert(addr, value);
            }
            Operand::Mem(name) | Operand::ByteMem(name) => {
                self.bytes.insert(symbol_addr(name), value as u8);
            }
            other => panic!("cannot write to {other:?}"),
        }
    }

    /// Returns the exit status once the program exits.
    fn syscall(&mut self) -> Option<u64> {
        match self.reg("rax") {
            0 => {
                assert_eq!(self.reg("rdi"), 0, "reads come from stdin");
                assert_eq!(self.reg("rdx"), 1, "reads are one byte");
                self.reads += 1;
                let read = match self.input.pop_front() {
                    Some(byte) => {
                        self.bytes.insert(self.reg("rsi"), byte);
                        1
                    }
                    None => 0,
                };
                self.regs.insert("rax".to_string(), read);
                None
            }
            1 => {
                assert_eq!(self.reg("rdi"), 1, "writes go to stdout");
                assert_eq!(self.reg("rdx"), 1, "writes are one byte");
                let byte = self.bytes.get(&self.reg("rsi")).copied().unwrap_or(0);
                self.output.push(byte);
                self.regs.insert("rax".to_string(), 1);
                None
            }
            60 => Some(self.reg("rdi")),
            other => panic!("unexpected syscall {other}"),
        }
    }
}

fn symbol_addr(name: &str) -> u64 {
    match name {
        "sum" => SUM_ADDR,
        "input_data" => INPUT_ADDR,
        other => panic!("unknown symbol {other}"),
    }
}

fn is_register(name: &str) -> bool {
    matches!(name, "rax" | "rbx" | "rdi" | "rsi" | "rdx" | "rsp" | "al")
}

fn parse_operand(text: &str) -> Operand {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("byte [").and_then(|t| t.strip_suffix(']')) {
        return Operand::ByteMem(inner.to_string());
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return Operand::Mem(inner.to_string());
    }
    if is_register(text) {
        return Operand::Reg(text.to_string());
    }
    match text.parse() {
        Ok(value) => Operand::Imm(value),
        Err(_) => Operand::Symbol(text.to_string()),
    }
}

fn parse(asm: &str) -> (Vec<Instr>, HashMap<String, usize>) {
    let mut program = Vec::new();
    let mut labels = HashMap::new();
    let mut in_text = false;

    for line in asm.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix("section ") {
            in_text = section.trim() == ".text";
            continue;
        }
        if !in_text || line.starts_with("global ") {
            continue;
        }
        if let Some(label) = line.strip_suffix(':') {
            let previous = labels.insert(label.to_string(), program.len());
            assert!(previous.is_none(), "duplicate label {label}");
            continue;
        }

        let (mnemonic, rest) = line.split_once(' ').unwrap_or((line, ""));
        let operands: Vec<Operand> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(parse_operand).collect()
        };
        let pair = || (operands[0].clone(), operands[1].clone());
        let instr = match mnemonic {
            "mov" => {
                let (dst, src) = pair();
                Instr::Mov(dst, src)
            }
            "movzx" => {
                let (dst, src) = pair();
                Instr::Movzx(dst, src)
            }
            "add" => {
                let (dst, src) = pair();
                Instr::Add(dst, src)
            }
            "sub" => {
                let (dst, src) = pair();
                Instr::Sub(dst, src)
            }
            "test" => {
                let (a, b) = pair();
                Instr::Test(a, b)
            }
            "jz" => Instr::Jz(rest.trim().to_string()),
            "jnz" => Instr::Jnz(rest.trim().to_string()),
            "syscall" => Instr::Syscall,
            other => panic!("unsupported instruction {other}"),
        };
        program.push(instr);
    }

    for instr in &program {
        if let Instr::Jz(label) | Instr::Jnz(label) = instr {
            assert!(labels.contains_key(label), "undefined label {label}");
        }
    }

    (program, labels)
}
