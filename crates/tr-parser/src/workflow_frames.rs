use tr_document::{ForEachSpec, ForEachStep, IfStep, SwitchCase, SwitchStep, WorkflowStep};

/// An open branch of a workflow `@if`/`@switch` under construction. Any
/// directive that doesn't continue the frame (a sibling `@elif`/`@case`, or
/// a nested `@step`/`@if`/`@switch`) flushes it — see Design Note
/// "Workflow if/switch stacking."
pub enum Frame {
    If {
        cond: String,
        then_branch: Vec<WorkflowStep>,
        elif_branches: Vec<(String, Vec<WorkflowStep>)>,
        else_branch: Vec<WorkflowStep>,
        /// `None` means we're filling `then_branch`; `Some(i)` means the i-th
        /// elif branch; a separate flag below handles `else`.
        active_elif: Option<usize>,
        in_else: bool,
    },
    Switch {
        expr: String,
        cases: Vec<SwitchCase>,
        default: Option<Vec<WorkflowStep>>,
        active_case: Option<usize>,
        in_default: bool,
    },
    ForEach {
        spec: ForEachSpec,
        body: Vec<WorkflowStep>,
    },
}

impl Frame {
    pub fn new_if(cond: String) -> Self {
        Frame::If {
            cond,
            then_branch: Vec::new(),
            elif_branches: Vec::new(),
            else_branch: Vec::new(),
            active_elif: None,
            in_else: false,
        }
    }

    pub fn new_switch(expr: String) -> Self {
        Frame::Switch {
            expr,
            cases: Vec::new(),
            default: None,
            active_case: None,
            in_default: false,
        }
    }

    pub fn new_for_each(spec: ForEachSpec) -> Self {
        Frame::ForEach {
            spec,
            body: Vec::new(),
        }
    }

    /// The step list currently receiving nested `@step`/`@if`/`@switch`.
    pub fn active_branch_mut(&mut self) -> &mut Vec<WorkflowStep> {
        match self {
            Frame::If {
                then_branch,
                elif_branches,
                else_branch,
                active_elif,
                in_else,
                ..
            } => {
                if *in_else {
                    else_branch
                } else if let Some(i) = active_elif {
                    &mut elif_branches[*i].1
                } else {
                    then_branch
                }
            }
            Frame::Switch {
                cases,
                default,
                active_case,
                in_default,
                ..
            } => {
                if *in_default {
                    default.get_or_insert_with(Vec::new)
                } else if let Some(i) = active_case {
                    &mut cases[*i].body
                } else {
                    // No case opened yet: treat as an (unreachable once a
                    // case/default arrives) scratch bucket.
                    default.get_or_insert_with(Vec::new)
                }
            }
            Frame::ForEach { body, .. } => body,
        }
    }

    pub fn add_elif(&mut self, cond: String) -> bool {
        match self {
            Frame::If {
                elif_branches,
                active_elif,
                in_else,
                ..
            } if !*in_else => {
                elif_branches.push((cond, Vec::new()));
                *active_elif = Some(elif_branches.len() - 1);
                true
            }
            _ => false,
        }
    }

    pub fn enter_else(&mut self) -> bool {
        match self {
            Frame::If { in_else, .. } => {
                *in_else = true;
                true
            }
            _ => false,
        }
    }

    pub fn add_case(&mut self, value: String) -> bool {
        match self {
            Frame::Switch {
                cases,
                active_case,
                in_default,
                ..
            } if !*in_default => {
                cases.push(SwitchCase {
                    value,
                    body: Vec::new(),
                });
                *active_case = Some(cases.len() - 1);
                true
            }
            _ => false,
        }
    }

    pub fn enter_default(&mut self) -> bool {
        match self {
            Frame::Switch { in_default, .. } => {
                *in_default = true;
                true
            }
            _ => false,
        }
    }

    pub fn into_step(self) -> WorkflowStep {
        match self {
            Frame::If {
                cond,
                then_branch,
                elif_branches,
                else_branch,
                ..
            } => WorkflowStep::If(IfStep {
                cond,
                then_branch,
                elif_branches,
                else_branch,
            }),
            Frame::Switch {
                expr,
                cases,
                default,
                ..
            } => WorkflowStep::Switch(SwitchStep {
                expr,
                cases,
                default,
            }),
            Frame::ForEach { spec, body } => WorkflowStep::ForEach(ForEachStep {
                for_each: spec,
                body,
            }),
        }
    }

    pub fn is_if(&self) -> bool {
        matches!(self, Frame::If { .. })
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Frame::Switch { .. })
    }
}
