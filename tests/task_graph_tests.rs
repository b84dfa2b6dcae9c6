//! Integration tests for task graph assembly through the model.
//!
//! Tests the contribution protocol, candidate fallback and lazy file lists
//! the way a loader would drive them: populate, validate, then query.

use buildgraph::config::ConfigValue;
use buildgraph::error::{ErrorCode, ModelError};
use buildgraph::{Model, Settings, Task, TaskTarget};
use std::path::{Path, PathBuf};

fn model() -> Model {
    Model::new(Settings::with_root("/work"))
}

fn dep_names(model: &Model, name: &str) -> Vec<String> {
    model
        .tasks
        .by_name(name)
        .unwrap()
        .deps()
        .iter()
        .map(|d| d.candidates()[0].clone())
        .collect()
}

fn subtask_names(model: &Model, name: &str) -> Vec<String> {
    let id = model.tasks.id_of(name).unwrap();
    model
        .tasks
        .subtask_names(id)
        .into_iter()
        .map(str::to_string)
        .collect()
}

mod contribution_tests {
    use super::*;

    #[test]
    fn contributors_chain_in_registration_order() {
        let mut model = model();
        model.add_task(Task::new("t1").with_append_to("build"));
        model.add_task(Task::new("generate"));
        model.add_task(Task::new("build").with_deps(["generate"]));
        model.add_task(Task::new("t2").with_append_to("build"));
        model.add_task(Task::new("clean").with_prepend_to("build"));
        model.validate().unwrap();

        assert_eq!(
            dep_names(&model, "build"),
            vec!["clean", "generate", "t1", "t2"]
        );
        assert_eq!(
            subtask_names(&model, "build"),
            vec!["clean", "generate", "t1", "t2"]
        );
    }

    #[test]
    fn deps_and_subtasks_stay_aligned() {
        let mut model = model();
        model.add_task(Task::new("a"));
        model.add_task(Task::new("b"));
        model.add_task(Task::new("target").with_deps(["a"]));
        model.add_task(Task::new("b2").with_append_to("target"));
        model.add_task(Task::new("b0").with_prepend_to("target"));
        model.validate().unwrap();

        let target = model.tasks.by_name("target").unwrap();
        let subtasks = target.subtasks().unwrap();
        assert_eq!(target.deps().len(), subtasks.len());
        for (dep, sub) in target.deps().iter().zip(subtasks) {
            assert!(dep.is_name(&model.tasks.get(*sub).name));
        }
    }

    #[test]
    fn append_target_falls_back_to_present_candidate() {
        let mut model = model();
        model.add_task(Task::new("present"));
        model.add_task(Task::new("fallback").with_append_to(vec!["missing", "present"]));
        model.validate().unwrap();
        assert_eq!(dep_names(&model, "present"), vec!["fallback"]);

        let mut model = super::model();
        model.add_task(Task::new("orphan").with_append_to(vec!["missing", "gone"]));
        let err = model.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::TaskResolution);
        assert!(matches!(
            err,
            ModelError::TaskResolution { ref task, .. } if task == "orphan"
        ));
    }

    #[test]
    fn candidate_dependency_picks_first_existing() {
        let mut model = model();
        model.add_task(Task::new("lint-fast"));
        model.add_task(
            Task::new("check").with_deps([TaskTarget::from(vec!["lint-full", "lint-fast"])]),
        );
        model.validate().unwrap();
        assert_eq!(subtask_names(&model, "check"), vec!["lint-fast"]);
    }

    #[test]
    fn execution_order_includes_contributions() {
        let mut model = model();
        model.add_task(Task::new("fetch"));
        model.add_task(Task::new("build").with_deps(["fetch"]));
        model.add_task(Task::new("codegen").with_prepend_to("build").with_deps(["fetch"]));
        model.validate().unwrap();

        let build = model.tasks.id_of("build").unwrap();
        let order: Vec<String> = model
            .tasks
            .execution_order(build)
            .unwrap()
            .into_iter()
            .map(|id| model.tasks.get(id).name.clone())
            .collect();
        assert_eq!(order, vec!["fetch", "codegen", "build"]);
    }
}

mod task_config_tests {
    use super::*;

    #[test]
    fn inputs_and_outputs_from_list_configs() {
        let mut model = model();
        let project = Path::new("/work/project");
        model
            .config
            .add_list("compile_in", Some(project), vec!["a.txt".into(), "a.txt".into()]);
        model
            .config
            .add_list("compile_in", Some(project), vec!["b.txt".into(), "${BASE_DIR}/c.txt".into()]);
        model
            .config
            .add_list("compile_out", Some(project), vec!["${ROOT_DIR}/out/app".into()]);
        let id = model.add_task(
            Task::new("compile")
                .with_inputs("compile_in")
                .with_outputs("compile_out"),
        );
        model.validate().unwrap();

        let task = model.tasks.get(id);
        assert_eq!(
            task.inputs(&model.config).unwrap(),
            [
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("/work/project/c.txt"),
            ]
        );
        assert_eq!(
            task.outputs(&model.config).unwrap(),
            [PathBuf::from("/work/out/app")]
        );
    }

    #[test]
    fn guards_and_params_follow_overrides() {
        let mut model = model();
        model.add_config("release", None, false);
        model.add_config("opt_level", None, 2);
        let mut params = buildgraph::config::ConfigMap::new();
        params.insert("level".into(), "${opt_level}".into());
        model.config.add_dict("package_params", None, params);
        let id = model.add_task(
            Task::new("package")
                .with_params("package_params")
                .with_run_if("release"),
        );
        model.validate().unwrap();

        let task = model.tasks.get(id);
        assert!(!task.should_run(&model.config).unwrap());
        model.apply_overrides(&[r#"{"release": true}"#]).unwrap();
        assert!(model.tasks.get(id).should_run(&model.config).unwrap());

        let params = model.tasks.get(id).resolve_params(&model.config).unwrap();
        assert_eq!(params["level"], ConfigValue::from(2));
    }
}
