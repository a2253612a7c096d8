use crate::constants::{TASK_ID_PREFIX, TEMPLATE_ID_PREFIX};
use fhir::{ActivityDefinition, Task, TaskIntent, TaskStatus};

pub(crate) fn map(template: &ActivityDefinition) -> Task {
    let mut task = Task::new(TaskStatus::Draft, TaskIntent::Plan);
    task.id = template
        .id
        .as_deref()
        .map(|id| id.replace(TEMPLATE_ID_PREFIX, TASK_ID_PREFIX));

    if let Some(code) = template.code() {
        task.code = Some(code.clone());
    }

    if template.has_extension() {
        task.extension = template.extension.clone();
    }

    if let Some(description) = template.description() {
        task.description = Some(description.to_string());
    }

    task
}
