use crate::cascade::environment::{Environment, ProcessEnvironment};
use crate::cascade::imports::ImportExpander;
use crate::cascade::naming::{FileLayer, Tier};
use crate::cascade::options::{ModePrecedence, ResolveOptions};
use crate::error::{EnvError, Result};
use crate::requirements::solve_all;
use crate::resolved::{EnvMap, Origin, ResolvedEnv};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Resolves env files and caches the last successful result.
///
/// The first `resolve` call reads the files; later calls return the cached
/// result unless `force` is set. A failed pass leaves the cache as it was.
#[derive(Debug)]
pub struct Resolver<E = ProcessEnvironment> {
	environment: E,
	cache: Option<ResolvedEnv>,
}

impl Resolver<ProcessEnvironment> {
	pub fn new() -> Self {
		Self::with_environment(ProcessEnvironment)
	}
}

impl Default for Resolver<ProcessEnvironment> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: Environment> Resolver<E> {
	pub fn with_environment(environment: E) -> Self {
		Self {
			environment,
			cache: None,
		}
	}

	pub fn resolve(&mut self, options: &ResolveOptions) -> Result<&ResolvedEnv> {
		let resolved = match self.cache.take() {
			Some(cached) if !options.force => {
				trace!("returning cached resolution");
				cached
			}
			previous => match resolve_with(options, &self.environment) {
				Ok(resolved) => resolved,
				Err(e) => {
					self.cache = previous;
					return Err(e);
				}
			},
		};

		Ok(self.cache.insert(resolved))
	}

	pub fn cached(&self) -> Option<&ResolvedEnv> {
		self.cache.as_ref()
	}

	/// Drop the cached result so the next call reads the files again.
	pub fn reset(&mut self) {
		self.cache = None;
	}
}

/// Resolve once against the process environment, without caching.
pub fn resolve(options: &ResolveOptions) -> Result<ResolvedEnv> {
	resolve_with(options, &ProcessEnvironment)
}

/// Resolve once against the given environment, without caching.
pub fn resolve_with<E: Environment>(options: &ResolveOptions, environment: &E) -> Result<ResolvedEnv> {
	debug!(base_path = %options.base_path.display(), "resolving env files");

	let mut cascade = Cascade::new(options);
	let live_mode = options
		.mode
		.clone()
		.or_else(|| environment.var(&options.mode_key))
		.filter(|mode| !mode.is_empty());

	let base_mode = cascade.merge(FileLayer::base(&options.base_path, &options.naming))?;
	let local_mode = cascade.merge(FileLayer::local(&options.base_path, &options.naming))?;
	let file_mode = base_mode.or(local_mode);

	let live_mode = live_mode.map(|mode| (mode, Origin::Environment));
	let seed = match options.mode_precedence {
		ModePrecedence::Environment => live_mode.clone().or(file_mode),
		ModePrecedence::Files => file_mode.or(live_mode.clone()),
	};
	let chased = cascade.chase(seed)?;
	let mode = match options.mode_precedence {
		ModePrecedence::Environment => live_mode.or(chased),
		ModePrecedence::Files => chased,
	};

	let Cascade {
		values: raw,
		mut origins,
		layers,
		..
	} = cascade;

	let mut values: EnvMap = raw
		.into_iter()
		.map(|(key, value)| (key, Value::String(value)))
		.collect();

	if let Some((mode, origin)) = &mode {
		values.insert(options.mode_key.clone(), Value::String(mode.clone()));
		origins.insert(options.mode_key.clone(), origin.clone());
	}

	if options.include_environment {
		for (key, value) in environment.vars() {
			if key == options.mode_key || values.contains_key(&key) {
				continue;
			}
			values.insert(key.clone(), Value::String(value));
			origins.insert(key, Origin::Environment);
		}
	}

	for (key, transform) in &options.transforms {
		let Some(Value::String(raw)) = values.get(key) else {
			continue;
		};
		let transformed = transform(raw).map_err(|source| EnvError::Transform {
			key: key.clone(),
			source,
		})?;
		values.insert(key.clone(), transformed);
	}

	for (key, value) in &options.defaults {
		if !values.contains_key(key) {
			values.insert(key.clone(), value.clone());
			origins.insert(key.clone(), Origin::Default);
		}
	}

	if let Some(schema) = &options.schema {
		values = schema.validate(values).map_err(EnvError::Validation)?;
		origins.retain(|key, _| values.contains_key(key));
		for key in values.keys() {
			origins.entry(key.clone()).or_insert(Origin::Schema);
		}
	}

	if let Some(failure) = solve_all(&options.required, &values) {
		debug!(%failure, "requirements not met");
		return Err(EnvError::MissingRequired { failure });
	}

	debug!(keys = values.len(), layers = layers.len(), "resolved env");

	Ok(ResolvedEnv {
		values,
		origins,
		layers,
		mode: mode.map(|(mode, _)| mode),
	})
}

/// Working state of a single pass over the files.
struct Cascade<'a> {
	options: &'a ResolveOptions,
	expander: ImportExpander<'a>,
	values: BTreeMap<String, String>,
	origins: BTreeMap<String, Origin>,
	layers: Vec<FileLayer>,
}

impl<'a> Cascade<'a> {
	fn new(options: &'a ResolveOptions) -> Self {
		Self {
			options,
			expander: ImportExpander::new(&options.naming, &options.mode_key),
			values: BTreeMap::new(),
			origins: BTreeMap::new(),
			layers: Vec::new(),
		}
	}

	/// Merge one file if it exists. Keys already set are left alone.
	///
	/// Returns the mode the file assigns, if any.
	fn merge(&mut self, layer: FileLayer) -> Result<Option<(String, Origin)>> {
		if !layer.path.is_file() {
			trace!(path = %layer.path.display(), tier = %layer.tier, "layer not present");
			return Ok(None);
		}

		debug!(path = %layer.path.display(), tier = %layer.tier, "merging layer");
		let expansion = self.expander.expand(&layer.path)?;

		for (key, entry) in expansion.collapse() {
			if key == self.options.mode_key || self.values.contains_key(key) {
				continue;
			}
			let tier = if entry.source == layer.path {
				layer.tier
			} else {
				Tier::Import
			};
			self.values.insert(key.to_string(), entry.value.clone());
			self.origins.insert(
				key.to_string(),
				Origin::File {
					path: entry.source.clone(),
					tier,
				},
			);
		}

		// An empty mode is the same as no mode.
		let mode = expansion
			.last_value(&self.options.mode_key)
			.filter(|mode| !mode.is_empty())
			.map(|mode| {
				(
					mode.to_string(),
					Origin::File {
						path: layer.path.clone(),
						tier: layer.tier,
					},
				)
			});

		self.layers.push(layer);
		self.layers
			.extend(expansion.imported.into_iter().map(|path| FileLayer {
				path,
				tier: Tier::Import,
			}));

		Ok(mode)
	}

	/// Follow mode redirects until the mode stops changing.
	fn chase(&mut self, seed: Option<(String, Origin)>) -> Result<Option<(String, Origin)>> {
		let Some((mut mode, mut origin)) = seed else {
			return Ok(None);
		};
		let mut visited = vec![mode.clone()];
		let options = self.options;
		let (dir, naming) = (&options.base_path, &options.naming);

		loop {
			let from_mode = self.merge(FileLayer::mode(dir, naming, &mode))?;
			let from_local = self.merge(FileLayer::mode_local(dir, naming, &mode))?;

			match from_mode.or(from_local) {
				Some((next, next_origin)) if next != mode => {
					if visited.contains(&next) {
						visited.push(next);
						return Err(EnvError::ModeCycle { chain: visited });
					}
					debug!(from = %mode, to = %next, "mode redirected");
					visited.push(next.clone());
					mode = next;
					origin = next_origin;
				}
				_ => return Ok(Some((mode, origin))),
			}
		}
	}
}
