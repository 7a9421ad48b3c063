use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use vdom_hooks::{
	h,
	memory::{MemoryArtifact, MemoryHost, Mutation},
	patch, Attributes, Component, ComponentId, Handler, Setter, TaskQueue,
};

type Log = Rc<RefCell<Vec<String>>>;
type Slot<T> = Rc<RefCell<Option<Setter<T>>>>;

fn setter<T>(slot: &Slot<T>) -> Setter<T> {
	slot.borrow().clone().expect("rendered at least once")
}

fn drain(log: &Log) -> Vec<String> {
	log.borrow_mut().drain(..).collect()
}

/// Renders `<p>{count}</p>` with one effect that depends on `count / 2`.
fn counter(host: &MemoryHost, root: &MemoryArtifact, ticks: &Rc<TaskQueue>) -> (Component<(), MemoryHost>, Slot<i32>, Log, Rc<Cell<u32>>) {
	let slot: Slot<i32> = Rc::default();
	let log: Log = Rc::default();
	let renders = Rc::new(Cell::new(0));

	let component = Component::mount(host.clone(), root.clone(), ticks.clone(), (), {
		let (slot, log, renders) = (slot.clone(), log.clone(), renders.clone());
		move |_, hooks| {
			renders.set(renders.get() + 1);
			let (count, set_count) = hooks.use_state(0);
			*slot.borrow_mut() = Some(set_count);

			let log = log.clone();
			let half = count / 2;
			hooks.use_effect(
				move || {
					log.borrow_mut().push(format!("run {}", half));
					Some(move || log.borrow_mut().push(format!("cleanup {}", half)))
				},
				half,
			);

			h!("p", Attributes::new(), count)
		}
	});
	(component, slot, log, renders)
}

#[test]
fn initial_render_is_synchronous() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());

	let (component, _, log, renders) = counter(&host, &root, &ticks);

	assert_eq!(root.to_markup(), "<root><p>0</p></root>");
	assert_eq!(renders.get(), 1);
	assert!(component.is_mounted());
	assert!(component.tree().as_ref().unwrap().is_materialized());

	// Effects wait for the next tick.
	assert!(log.borrow().is_empty());
	assert_eq!(ticks.len(), 1);
	assert_eq!(ticks.run_pending(), 1);
	assert_eq!(drain(&log), ["run 0"]);
}

#[test]
fn state_persists_and_every_set_renders() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (component, slot, _, renders) = counter(&host, &root, &ticks);

	setter(&slot).set(5);
	assert_eq!(root.to_markup(), "<root><p>5</p></root>");
	assert_eq!(renders.get(), 2);

	// Equal values still render.
	setter(&slot).set(5);
	assert_eq!(renders.get(), 3);

	// Updates without a set keep the state.
	component.update();
	assert_eq!(renders.get(), 4);
	assert_eq!(root.to_markup(), "<root><p>5</p></root>");
}

#[test]
fn rerenders_update_the_existing_artifacts() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (_component, slot, _, _) = counter(&host, &root, &ticks);
	let p = root.child(0).unwrap();
	host.take_mutations();

	setter(&slot).set(1);

	assert_eq!(host.take_mutations(), [Mutation::SetText("1".to_owned())]);
	assert!(root.child(0).unwrap().ptr_eq(&p));
}

#[test]
fn effects_run_only_when_dependencies_change() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (_component, slot, log, _) = counter(&host, &root, &ticks);

	ticks.run_pending();
	assert_eq!(drain(&log), ["run 0"]);

	// 1 / 2 == 0 / 2
	setter(&slot).set(1);
	ticks.run_pending();
	assert!(drain(&log).is_empty());

	setter(&slot).set(2);
	ticks.run_pending();
	assert_eq!(drain(&log), ["cleanup 0", "run 1"]);
}

#[test]
fn one_check_consumes_the_latest_registration() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (_component, slot, log, _) = counter(&host, &root, &ticks);

	setter(&slot).set(2);
	setter(&slot).set(4);
	assert_eq!(ticks.len(), 3);

	ticks.run_pending();
	assert_eq!(drain(&log), ["run 2"]);
}

#[test]
fn unmount_cleans_up_and_stops_updates() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (component, slot, log, renders) = counter(&host, &root, &ticks);
	ticks.run_pending();
	drain(&log);

	setter(&slot).set(2);
	component.unmount();

	assert!(!component.is_mounted());
	assert!(root.children().is_empty());
	assert!(component.tree().is_none());
	assert_eq!(drain(&log), ["cleanup 0"]);

	// The check scheduled by the last render does nothing.
	ticks.run_pending();
	assert!(drain(&log).is_empty());

	setter(&slot).set(3);
	component.update();
	component.unmount();
	assert_eq!(renders.get(), 2);
	assert!(ticks.is_empty());
}

#[test]
fn setters_outliving_their_component_do_nothing() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let (component, slot, _, renders) = counter(&host, &root, &ticks);

	drop(component);
	setter(&slot).set(1);

	assert_eq!(renders.get(), 1);
	assert_eq!(ticks.run_pending(), 1);
	assert_eq!(root.to_markup(), "<root><p>0</p></root>");
}

#[test]
fn setting_state_during_render_renders_again() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let renders = Rc::new(Cell::new(0));

	let _component = Component::mount(host, root.clone(), ticks.clone(), (), {
		let renders = renders.clone();
		move |_, hooks| {
			renders.set(renders.get() + 1);
			let (count, set_count) = hooks.use_state(0);
			if count < 3 {
				set_count.set(count + 1);
			}
			h!("p", Attributes::new(), count)
		}
	});

	assert_eq!(renders.get(), 4);
	assert_eq!(root.to_markup(), "<root><p>3</p></root>");
}

#[test]
fn effects_may_set_state() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());

	let _component = Component::mount(host, root.clone(), ticks.clone(), (), |_, hooks| {
		let (loaded, set_loaded) = hooks.use_state(false);
		hooks.use_effect(
			move || {
				if !loaded {
					set_loaded.set(true);
				}
				None::<fn()>
			},
			(),
		);
		h!("p", Attributes::new(), if loaded { "ready" } else { "loading" })
	});

	assert_eq!(root.to_markup(), "<root><p>loading</p></root>");
	ticks.run_pending();
	assert_eq!(root.to_markup(), "<root><p>ready</p></root>");

	// Unchanged dependencies: the second check does nothing.
	ticks.run_pending();
	assert!(ticks.is_empty());
}

#[test]
fn hooks_keep_their_slots() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let names: Slot<&'static str> = Rc::default();

	let _component = Component::mount(host, root.clone(), ticks, (), {
		let names = names.clone();
		move |_, hooks| {
			let (count, _) = hooks.use_state(7_u32);
			let (name, set_name) = hooks.use_state("Ada");
			let (flag, _) = hooks.use_state(true);
			*names.borrow_mut() = Some(set_name);
			h!("p", Attributes::new(), name, " ", count, " ", flag)
		}
	});

	setter(&names).set("Grace");
	assert_eq!(root.to_markup(), "<root><p>Grace 7 true</p></root>");
}

#[test]
fn handlers_drive_state() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());

	let _component = Component::mount(host.clone(), root.clone(), ticks, (), |_, hooks| {
		let (count, set_count) = hooks.use_state(0);
		h!("button", Attributes::new().with("onClick", Handler::new(move |_| set_count.set(count + 1))), count)
	});

	let button = root.child(0).unwrap();
	assert!(button.dispatch("click"));
	assert!(button.dispatch("click"));
	assert_eq!(root.to_markup(), "<root><button>2</button></root>");

	// Each render binds a fresh handler and releases the previous one.
	assert_eq!(host.live_handlers(), 1);
}

#[test]
fn properties_reach_the_render_callback() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());

	let component = Component::mount(host, root.clone(), ticks, String::from("Ada"), |name: &String, _| h!("p", Attributes::new(), "Hello, ", name));

	assert_eq!(component.properties(), "Ada");
	assert_eq!(root.to_markup(), "<root><p>Hello, Ada</p></root>");
}

#[test]
fn identities() {
	let host = MemoryHost::new();
	let ticks = Rc::new(TaskQueue::new());

	let named = Component::builder(host.clone(), MemoryArtifact::element("root"), ticks.clone())
		.identity("todo-list")
		.mount((), |_, _| h!("ul", Attributes::new()));
	assert_eq!(named.identity(), &ComponentId::from("todo-list"));
	assert_eq!(named.identity().to_string(), "todo-list");

	let a = Component::mount(host.clone(), MemoryArtifact::element("root"), ticks.clone(), (), |_, _| h!("p", Attributes::new()));
	let b = Component::mount(host, MemoryArtifact::element("root"), ticks, (), |_, _| h!("p", Attributes::new()));
	assert_ne!(a.identity(), b.identity());
	assert!(!a.identity().as_str().is_empty());
}

#[test]
fn adopted_trees_are_updated_in_place() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());

	let existing = patch(&host, &root, None, Some(h!("p", Attributes::new(), "server"))).unwrap();
	let p = root.child(0).unwrap();
	host.take_mutations();

	let _component = Component::builder(host.clone(), root.clone(), ticks)
		.adopt(existing)
		.mount((), |_, _| h!("p", Attributes::new(), "client"));

	assert_eq!(host.take_mutations(), [Mutation::SetText("client".to_owned())]);
	assert_eq!(root.children().len(), 1);
	assert!(root.child(0).unwrap().ptr_eq(&p));
}

#[test]
fn independent_state_slots_survive_interleaved_sets() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let numbers: Slot<i32> = Rc::default();
	let letters: Slot<&'static str> = Rc::default();

	let _component = Component::mount(host, root.clone(), ticks, (), {
		let (numbers, letters) = (numbers.clone(), letters.clone());
		move |_, hooks| {
			let (number, set_number) = hooks.use_state(1);
			let (letter, set_letter) = hooks.use_state("x");
			*numbers.borrow_mut() = Some(set_number);
			*letters.borrow_mut() = Some(set_letter);
			h!("p", Attributes::new(), number, "/", letter)
		}
	});
	assert_eq!(root.to_markup(), "<root><p>1/x</p></root>");

	setter(&letters).set("y");
	assert_eq!(root.to_markup(), "<root><p>1/y</p></root>");

	setter(&numbers).set(7);
	assert_eq!(root.to_markup(), "<root><p>7/y</p></root>");

	setter(&letters).set("z");
	assert_eq!(root.to_markup(), "<root><p>7/z</p></root>");
}

#[test]
fn unmounting_during_render_discards_the_new_tree() {
	let host = MemoryHost::new();
	let root = MemoryArtifact::element("root");
	let ticks = Rc::new(TaskQueue::new());
	let handle: Rc<RefCell<Option<Component<(), MemoryHost>>>> = Rc::default();
	let leaving = Rc::new(Cell::new(false));

	let component = Component::mount(host.clone(), root.clone(), ticks.clone(), (), {
		let (handle, leaving) = (handle.clone(), leaving.clone());
		move |_, _| {
			if leaving.get() {
				if let Some(component) = handle.borrow().as_ref() {
					component.unmount();
				}
			}
			h!("p", Attributes::new(), 0)
		}
	});
	*handle.borrow_mut() = Some(component.clone());
	ticks.run_pending();

	leaving.set(true);
	component.update();

	assert!(!component.is_mounted());
	assert!(root.children().is_empty());
	assert!(component.tree().is_none());
	assert!(ticks.is_empty());

	handle.borrow_mut().take();
}
