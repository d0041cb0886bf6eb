//! Sandboxed Lua formula evaluator.
//!
//! Formulas are Lua expressions over the variables of one scope, e.g.
//! `x * 2 + 1` or `math.sqrt(a ^ 2 + b ^ 2)`. Each evaluation runs in a fresh
//! environment table holding the safe globals plus the inputs. Library tables
//! are exposed through read-only proxies and `_G` points at the per-call
//! environment, so formulas cannot leak state into each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use mlua::{
    Function, HookTriggers, Lua, LuaOptions, Result as LuaResult, StdLib, Table,
    Value as LuaValue, VmState,
};

use super::{EvaluationError, Evaluator, Inputs};
use crate::variables::Value;

/// Instructions between two checks of the instruction budget.
const HOOK_STRIDE: u32 = 1_000;

/// Configuration for the Lua sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum memory the Lua VM can allocate (in bytes). 0 = unlimited.
    pub memory_limit: usize,

    /// Maximum instructions per formula. 0 = unlimited.
    pub instruction_limit: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::restricted()
    }
}

impl SandboxConfig {
    /// A restrictive sandbox suitable for document formulas.
    #[must_use]
    pub fn restricted() -> Self {
        Self { memory_limit: 10 * 1024 * 1024, instruction_limit: 100_000 }
    }
}

/// Evaluates formulas in a sandboxed Lua VM.
///
/// # Example
///
/// ```rust
/// use inkvar_core::evaluation::{Evaluator, Inputs, LuaEvaluator};
/// use inkvar_core::variables::Value;
///
/// let lua = LuaEvaluator::sandboxed().unwrap();
/// let mut inputs = Inputs::new();
/// inputs.insert("x".into(), Value::Number(4.0));
/// assert_eq!(lua.evaluate("x * 2 + 1", &inputs).unwrap(), Value::Number(9.0));
/// ```
pub struct LuaEvaluator {
    lua: Lua,
    /// `__newindex` handler shared by every read-only proxy.
    deny_write: Function,
    /// Instructions spent by the running formula, reset per evaluation.
    executed: Arc<AtomicU32>,
}

impl LuaEvaluator {
    /// Create an evaluator with the given sandbox configuration.
    pub fn new(config: &SandboxConfig) -> Result<Self, EvaluationError> {
        // Base functions are always loaded; add table, string, utf8, math.
        let libs = StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
        let lua = Lua::new_with(libs, LuaOptions::default())?;

        if config.memory_limit > 0 {
            lua.set_memory_limit(config.memory_limit)?;
        }

        Self::apply_sandbox(&lua)?;

        let executed = Arc::new(AtomicU32::new(0));
        if config.instruction_limit > 0 {
            Self::limit_instructions(&lua, config.instruction_limit, Arc::clone(&executed));
        }

        let deny_write = lua.create_function(|_, _: (LuaValue, LuaValue, LuaValue)| -> LuaResult<()> {
            Err(mlua::Error::runtime("attempt to modify a read-only library table"))
        })?;

        Ok(Self { lua, deny_write, executed })
    }

    /// Create an evaluator with the default restrictive sandbox.
    pub fn sandboxed() -> Result<Self, EvaluationError> {
        Self::new(&SandboxConfig::restricted())
    }

    /// Remove globals that reach outside the VM or load code.
    fn apply_sandbox(lua: &Lua) -> LuaResult<()> {
        // The string metatable's __index is the real string library.
        lua.load(r#"getmetatable("").__metatable = false"#).set_name("sandbox").exec()?;

        let globals = lua.globals();
        for name in [
            "dofile",
            "loadfile",
            "load",
            "require",
            "package",
            "io",
            "os",
            "debug",
            "collectgarbage",
        ] {
            globals.set(name, LuaValue::Nil)?;
        }
        Ok(())
    }

    /// Abort any formula that runs past `limit` instructions.
    fn limit_instructions(lua: &Lua, limit: u32, executed: Arc<AtomicU32>) {
        let stride = limit.min(HOOK_STRIDE);
        lua.set_hook(HookTriggers::new().every_nth_instruction(stride), move |_, _| {
            let total = executed.fetch_add(stride, Ordering::Relaxed).saturating_add(stride);
            if total >= limit {
                Err(mlua::Error::runtime(format!("instruction limit of {limit} exceeded")))
            } else {
                Ok(VmState::Continue)
            }
        });
    }

    /// Fresh environment: the sandboxed globals plus the inputs.
    fn environment(&self, inputs: &Inputs) -> LuaResult<Table> {
        let env = self.lua.create_table()?;
        for pair in self.lua.globals().pairs::<LuaValue, LuaValue>() {
            let (key, value) = pair?;
            let value = match value {
                LuaValue::Table(lib) => LuaValue::Table(self.read_only(lib)?),
                other => other,
            };
            env.raw_set(key, value)?;
        }
        env.raw_set("_G", env.clone())?;
        for (name, value) in inputs {
            env.raw_set(name.as_str(), self.to_lua(value)?)?;
        }
        Ok(env)
    }

    /// Proxy that reads through to `target` and rejects writes.
    fn read_only(&self, target: Table) -> LuaResult<Table> {
        let meta = self.lua.create_table()?;
        meta.raw_set("__index", target)?;
        meta.raw_set("__newindex", self.deny_write.clone())?;
        meta.raw_set("__metatable", false)?;

        let proxy = self.lua.create_table()?;
        proxy.set_metatable(Some(meta));
        Ok(proxy)
    }

    fn to_lua(&self, value: &Value) -> LuaResult<LuaValue> {
        Ok(match value {
            Value::Null => LuaValue::Nil,
            Value::Bool(b) => LuaValue::Boolean(*b),
            Value::Number(n) => LuaValue::Number(*n),
            Value::String(s) => LuaValue::String(self.lua.create_string(s)?),
        })
    }
}

fn from_lua(value: LuaValue) -> Result<Value, EvaluationError> {
    match value {
        LuaValue::Nil => Ok(Value::Null),
        LuaValue::Boolean(b) => Ok(Value::Bool(b)),
        LuaValue::Integer(i) => Ok(Value::Number(i as f64)),
        LuaValue::Number(n) => Ok(Value::Number(n)),
        LuaValue::String(s) => Ok(Value::String(s.to_str()?.to_string())),
        other => Err(EvaluationError::UnsupportedResult(other.type_name())),
    }
}

impl Evaluator for LuaEvaluator {
    fn evaluate(&self, formula: &str, inputs: &Inputs) -> Result<Value, EvaluationError> {
        let env = self.environment(inputs)?;
        self.executed.store(0, Ordering::Relaxed);
        let value: LuaValue =
            self.lua.load(formula).set_name("formula").set_environment(env).eval()?;
        from_lua(value)
    }
}
