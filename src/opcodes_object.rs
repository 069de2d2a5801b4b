/// Object tree, attribute and property operations
///
/// The table layout lives in `zobject::ObjectTable`; these handlers only
/// translate opcodes into table calls and feed results to store and branch.
use log::debug;

use crate::error::{Result, ZError};
use crate::interpreter::Interpreter;
use crate::zobject::ObjectTable;

impl Interpreter {
    // ---- TREE ----

    pub fn op_get_sibling(&mut self, obj: u16) -> Result<()> {
        let sibling = self.objects.sibling(&self.memory, obj)?;
        debug!("get_sibling {} = {}", obj, sibling);
        self.store_return(sibling)?;
        self.branch(sibling != 0)
    }

    pub fn op_get_child(&mut self, obj: u16) -> Result<()> {
        let child = self.objects.child(&self.memory, obj)?;
        debug!("get_child {} = {}", obj, child);
        self.store_return(child)?;
        self.branch(child != 0)
    }

    pub fn op_get_parent(&mut self, obj: u16) -> Result<()> {
        let parent = self.objects.parent(&self.memory, obj)?;
        debug!("get_parent {} = {}", obj, parent);
        self.store_return(parent)
    }

    pub fn op_jin(&mut self, obj: u16, parent: u16) -> Result<()> {
        let actual = self.objects.parent(&self.memory, obj)?;
        debug!("jin {} {} (parent {})", obj, parent, actual);
        self.branch(actual == parent)
    }

    pub fn op_remove_obj(&mut self, obj: u16) -> Result<()> {
        debug!("remove_obj {}", obj);
        self.objects.remove(&mut self.memory, obj)
    }

    pub fn op_insert_obj(&mut self, obj: u16, dest: u16) -> Result<()> {
        debug!("insert_obj {} into {}", obj, dest);
        self.objects.insert(&mut self.memory, obj, dest)
    }

    // ---- ATTRIBUTES ----

    pub fn op_test_attr(&mut self, obj: u16, attr: u16) -> Result<()> {
        let set = self.objects.attribute(&self.memory, obj, attr)?;
        debug!("test_attr {} {} = {}", obj, attr, set);
        self.branch(set)
    }

    pub fn op_set_attr(&mut self, obj: u16, attr: u16) -> Result<()> {
        debug!("set_attr {} {}", obj, attr);
        self.objects.set_attribute(&mut self.memory, obj, attr, true)
    }

    pub fn op_clear_attr(&mut self, obj: u16, attr: u16) -> Result<()> {
        debug!("clear_attr {} {}", obj, attr);
        self.objects.set_attribute(&mut self.memory, obj, attr, false)
    }

    // ---- PROPERTIES ----

    pub fn op_get_prop(&mut self, obj: u16, prop: u16) -> Result<()> {
        let value = self.objects.property(&self.memory, obj, prop)?;
        debug!("get_prop {} {} = {:04x}", obj, prop, value);
        self.store_return(value)
    }

    pub fn op_get_prop_addr(&mut self, obj: u16, prop: u16) -> Result<()> {
        let addr = self.objects.property_address(&self.memory, obj, prop)?;
        debug!("get_prop_addr {} {} = {:04x}", obj, prop, addr);
        self.store_return(addr)
    }

    pub fn op_get_next_prop(&mut self, obj: u16, prop: u16) -> Result<()> {
        let next = self.objects.next_property(&self.memory, obj, prop)?;
        debug!("get_next_prop {} {} = {}", obj, prop, next);
        self.store_return(next)
    }

    pub fn op_get_prop_len(&mut self, addr: u16) -> Result<()> {
        let len = ObjectTable::property_len(&self.memory, addr)?;
        debug!("get_prop_len {:04x} = {}", addr, len);
        self.store_return(len)
    }

    pub fn op_put_prop(&mut self, operands: &[u16]) -> Result<()> {
        let &[obj, prop, value] = operands else {
            return Err(ZError::OperandCount {
                name: "put_prop",
                expected: "3",
                got: operands.len(),
            });
        };
        debug!("put_prop {} {} = {:04x}", obj, prop, value);
        self.objects.put_property(&mut self.memory, obj, prop, value)
    }
}
